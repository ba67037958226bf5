//! The matcher pipeline. Every matcher inspects one attribute of an intercepted request against
//! a mock's [`MockRequestSpec`] and either accepts it or explains the mismatch.

use crate::{
    common::data::{InterceptedRequest, MockRequestSpec},
    intercept::error::MatchError,
};
use similar::{ChangeTag, TextDiff};
use std::sync::Arc;

pub(crate) mod body;
pub(crate) mod comparators;
pub(crate) mod cookie;
pub(crate) mod key_value;
pub(crate) mod url;

use body::BodyMatcher;
use comparators::{ExactOrRegexMatchComparator, StringExactMatchComparator};
use cookie::CookieMatcher;
use key_value::{KeyValueMatcher, MatchingStrategy, PresenceMatcher};
use url::{HostMatcher, MethodMatcher, PathMatcher, SchemeMatcher};

/// A single-attribute predicate. `mismatch` returns `None` when the attribute matched.
///
/// Implementations must be free of side effects: the same matcher is shared by every mock and
/// may run concurrently.
pub trait Matcher {
    fn name(&self) -> &str;
    fn mismatch(&self, req: &InterceptedRequest, spec: &MockRequestSpec) -> Option<MatchError>;
}

pub type MatcherRef = Arc<dyn Matcher + Send + Sync>;

/// Adapts a named closure to the [`Matcher`] trait. The closure returns `Err(reason)` to reject
/// a request.
pub struct FunctionMatcher {
    name: String,
    function: Box<
        dyn Fn(&InterceptedRequest, &MockRequestSpec) -> Result<(), String> + Send + Sync,
    >,
}

impl FunctionMatcher {
    pub fn new<N, F>(name: N, function: F) -> Self
    where
        N: Into<String>,
        F: Fn(&InterceptedRequest, &MockRequestSpec) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            function: Box::new(function),
        }
    }
}

impl Matcher for FunctionMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn mismatch(&self, req: &InterceptedRequest, spec: &MockRequestSpec) -> Option<MatchError> {
        (self.function)(req, spec)
            .err()
            .map(|reason| MatchError::new(self.name.as_str(), reason))
    }
}

lazy_static! {
    static ref DEFAULT_MATCHERS: Vec<MatcherRef> = vec![
        Arc::new(PathMatcher {}),
        Arc::new(HostMatcher {}),
        Arc::new(SchemeMatcher {
            comparator: Box::new(StringExactMatchComparator::new(false)),
        }),
        Arc::new(MethodMatcher {
            comparator: Box::new(StringExactMatchComparator::new(true)),
        }),
        // headers
        Arc::new(KeyValueMatcher {
            name: "header",
            entity_name: "header",
            case_sensitive_keys: false,
            expectation: |spec| &spec.headers,
            request_value: |req| req.headers_vec().clone(),
            value_comparator: Box::new(ExactOrRegexMatchComparator::new()),
        }),
        Arc::new(PresenceMatcher {
            name: "header_present",
            entity_name: "header",
            strategy: MatchingStrategy::Presence,
            case_sensitive_keys: false,
            expectation: |spec| &spec.header_present,
            request_keys: |req| req.headers_vec().iter().map(|(k, _)| k.clone()).collect(),
        }),
        Arc::new(PresenceMatcher {
            name: "header_not_present",
            entity_name: "header",
            strategy: MatchingStrategy::Absence,
            case_sensitive_keys: false,
            expectation: |spec| &spec.header_not_present,
            request_keys: |req| req.headers_vec().iter().map(|(k, _)| k.clone()).collect(),
        }),
        // query parameters
        Arc::new(KeyValueMatcher {
            name: "query",
            entity_name: "query param",
            case_sensitive_keys: true,
            expectation: |spec| &spec.query,
            request_value: |req| req.query_params_vec(),
            value_comparator: Box::new(ExactOrRegexMatchComparator::new()),
        }),
        Arc::new(PresenceMatcher {
            name: "query_present",
            entity_name: "query param",
            strategy: MatchingStrategy::Presence,
            case_sensitive_keys: true,
            expectation: |spec| &spec.query_present,
            request_keys: |req| req.query_params_vec().into_iter().map(|(k, _)| k).collect(),
        }),
        Arc::new(PresenceMatcher {
            name: "query_not_present",
            entity_name: "query param",
            strategy: MatchingStrategy::Absence,
            case_sensitive_keys: true,
            expectation: |spec| &spec.query_not_present,
            request_keys: |req| req.query_params_vec().into_iter().map(|(k, _)| k).collect(),
        }),
        // form fields
        Arc::new(KeyValueMatcher {
            name: "form",
            entity_name: "form field",
            case_sensitive_keys: true,
            expectation: |spec| &spec.form,
            request_value: |req| req.form_params_vec(),
            value_comparator: Box::new(ExactOrRegexMatchComparator::new()),
        }),
        Arc::new(PresenceMatcher {
            name: "form_present",
            entity_name: "form field",
            strategy: MatchingStrategy::Presence,
            case_sensitive_keys: true,
            expectation: |spec| &spec.form_present,
            request_keys: |req| req.form_params_vec().into_iter().map(|(k, _)| k).collect(),
        }),
        Arc::new(PresenceMatcher {
            name: "form_not_present",
            entity_name: "form field",
            strategy: MatchingStrategy::Absence,
            case_sensitive_keys: true,
            expectation: |spec| &spec.form_not_present,
            request_keys: |req| req.form_params_vec().into_iter().map(|(k, _)| k).collect(),
        }),
        Arc::new(BodyMatcher::new()),
        // cookies
        Arc::new(CookieMatcher {}),
        Arc::new(PresenceMatcher {
            name: "cookie_present",
            entity_name: "cookie",
            strategy: MatchingStrategy::Presence,
            case_sensitive_keys: true,
            expectation: |spec| &spec.cookie_present,
            request_keys: |req| req.cookies().into_iter().map(|c| c.name).collect(),
        }),
        Arc::new(PresenceMatcher {
            name: "cookie_not_present",
            entity_name: "cookie",
            strategy: MatchingStrategy::Absence,
            case_sensitive_keys: true,
            expectation: |spec| &spec.cookie_not_present,
            request_keys: |req| req.cookies().into_iter().map(|c| c.name).collect(),
        }),
    ];
}

/// The matchers every new mock starts with, in evaluation order.
pub fn defaults() -> Vec<MatcherRef> {
    DEFAULT_MATCHERS.clone()
}

/// Runs every matcher of `spec` against `req` and collects the mismatches in pipeline order.
pub(crate) fn mismatches(req: &InterceptedRequest, spec: &MockRequestSpec) -> Vec<MatchError> {
    spec.matchers
        .iter()
        .filter_map(|matcher| {
            let result = matcher.mismatch(req, spec);
            tracing::trace!(
                "Matcher '{}' {}",
                matcher.name(),
                if result.is_none() { "matched" } else { "did not match" }
            );
            result
        })
        .collect()
}

/// Renders a line diff between `expected` and `actual`. Unchanged lines are prefixed with a
/// space, removed lines with `-` and added lines with `+`.
pub(crate) fn diff_str(expected: &str, actual: &str) -> String {
    let changes = TextDiff::from_lines(expected, actual);

    changes
        .iter_all_changes()
        .map(|change| {
            let sign = match change.tag() {
                ChangeTag::Equal => " ",
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
            };
            format!("{}{}", sign, change.to_string_lossy().trim_end_matches('\n'))
        })
        .collect::<Vec<String>>()
        .join("\n")
}
