use crate::{
    common::data::{InterceptedRequest, MockRequestSpec},
    intercept::{cookies::compare_cookies, error::MatchError, matchers::Matcher},
};

/// Requires every declared cookie to be sent with the request. Only the fields a declared cookie
/// sets are compared.
pub(crate) struct CookieMatcher {}

impl Matcher for CookieMatcher {
    fn name(&self) -> &str {
        "cookie"
    }

    fn mismatch(&self, req: &InterceptedRequest, spec: &MockRequestSpec) -> Option<MatchError> {
        if spec.cookies.is_empty() {
            return None;
        }

        let received = req.cookies();

        let failures: Vec<String> = spec
            .cookies
            .iter()
            .filter_map(|expected| {
                let mut field_errors = Vec::new();
                for actual in &received {
                    let (found, errors) = compare_cookies(expected, actual);
                    if !found {
                        continue;
                    }
                    if errors.is_empty() {
                        return None;
                    }
                    field_errors = errors;
                }

                match field_errors.is_empty() {
                    true => Some(format!(
                        "expected cookie with name '{}' not received",
                        expected.name()
                    )),
                    false => Some(format!(
                        "failed to match cookie '{}': {}",
                        expected.name(),
                        field_errors.join(", ")
                    )),
                }
            })
            .collect();

        if failures.is_empty() {
            return None;
        }

        Some(MatchError::new(self.name(), failures.join("; ")))
    }
}
