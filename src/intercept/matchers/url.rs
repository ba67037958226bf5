use crate::{
    common::{
        data::{InterceptedRequest, MockRequestSpec},
        util::matches_exact_or_regex,
    },
    intercept::{
        error::MatchError,
        matchers::{comparators::ValueComparator, Matcher},
    },
};

fn declared(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// ************************************************************************************************
// PathMatcher
// ************************************************************************************************
pub(crate) struct PathMatcher {}

impl Matcher for PathMatcher {
    fn name(&self) -> &str {
        "path"
    }

    fn mismatch(&self, req: &InterceptedRequest, spec: &MockRequestSpec) -> Option<MatchError> {
        let mock_path = declared(&spec.path)?;
        let received_path = req.path();

        if matches_exact_or_regex(mock_path, &received_path) {
            return None;
        }

        Some(MatchError::new(
            self.name(),
            format!(
                "received path {} did not match mock path {}",
                received_path, mock_path
            ),
        ))
    }
}

// ************************************************************************************************
// HostMatcher
// ************************************************************************************************
pub(crate) struct HostMatcher {}

impl Matcher for HostMatcher {
    fn name(&self) -> &str {
        "host"
    }

    fn mismatch(&self, req: &InterceptedRequest, spec: &MockRequestSpec) -> Option<MatchError> {
        let mock_host = declared(&spec.host)?;
        let received_host = req.authority().unwrap_or_default();

        if matches_exact_or_regex(mock_host, &received_host) {
            return None;
        }

        Some(MatchError::new(
            self.name(),
            format!(
                "received host {} did not match mock host {}",
                received_host, mock_host
            ),
        ))
    }
}

// ************************************************************************************************
// SchemeMatcher
// ************************************************************************************************
pub(crate) struct SchemeMatcher {
    pub comparator: Box<dyn ValueComparator<str, str> + Send + Sync>,
}

impl Matcher for SchemeMatcher {
    fn name(&self) -> &str {
        "scheme"
    }

    fn mismatch(&self, req: &InterceptedRequest, spec: &MockRequestSpec) -> Option<MatchError> {
        let mock_scheme = declared(&spec.scheme)?;
        // Origin-form requests carry no scheme to compare against.
        let received_scheme = req.scheme()?;

        if self.comparator.matches(mock_scheme, &received_scheme) {
            return None;
        }

        Some(MatchError::new(
            self.name(),
            format!(
                "received scheme {} did not match mock scheme {}",
                received_scheme, mock_scheme
            ),
        ))
    }
}

// ************************************************************************************************
// MethodMatcher
// ************************************************************************************************
pub(crate) struct MethodMatcher {
    pub comparator: Box<dyn ValueComparator<str, str> + Send + Sync>,
}

impl Matcher for MethodMatcher {
    fn name(&self) -> &str {
        "method"
    }

    fn mismatch(&self, req: &InterceptedRequest, spec: &MockRequestSpec) -> Option<MatchError> {
        let mock_method = declared(&spec.method)?;
        let received_method = req.method_str();

        if self.comparator.matches(mock_method, received_method) {
            return None;
        }

        Some(MatchError::new(
            self.name(),
            format!(
                "received method {} did not match mock method {}",
                received_method, mock_method
            ),
        ))
    }
}
