use crate::common::util::matches_exact_or_regex;
use assert_json_diff::{assert_json_matches_no_panic, CompareMode, Config};
use serde_json::Value;

pub(crate) trait ValueComparator<S: ?Sized, T: ?Sized> {
    fn matches(&self, mock_value: &S, req_value: &T) -> bool;
}

// ************************************************************************************************
// StringExactMatchComparator
// ************************************************************************************************
pub(crate) struct StringExactMatchComparator {
    case_sensitive: bool,
}

impl StringExactMatchComparator {
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }
}

impl ValueComparator<str, str> for StringExactMatchComparator {
    fn matches(&self, mock_value: &str, req_value: &str) -> bool {
        match self.case_sensitive {
            true => mock_value.eq(req_value),
            false => mock_value.eq_ignore_ascii_case(req_value),
        }
    }
}

// ************************************************************************************************
// ExactOrRegexMatchComparator
// ************************************************************************************************

/// Compares exactly first and falls back to interpreting the mock value as a regular
/// expression. A literal that happens to contain regex metacharacters may therefore match
/// values it is not equal to.
pub(crate) struct ExactOrRegexMatchComparator {}

impl ExactOrRegexMatchComparator {
    pub fn new() -> Self {
        Self {}
    }
}

impl ValueComparator<str, str> for ExactOrRegexMatchComparator {
    fn matches(&self, mock_value: &str, req_value: &str) -> bool {
        matches_exact_or_regex(mock_value, req_value)
    }
}

// ************************************************************************************************
// JSONExactMatchComparator
// ************************************************************************************************

/// Structural JSON equality: key order and insignificant whitespace are irrelevant.
pub(crate) struct JSONExactMatchComparator {}

impl JSONExactMatchComparator {
    pub fn new() -> Self {
        Self {}
    }
}

impl ValueComparator<Value, Value> for JSONExactMatchComparator {
    fn matches(&self, mock_value: &Value, req_value: &Value) -> bool {
        let config = Config::new(CompareMode::Strict);
        assert_json_matches_no_panic(mock_value, req_value, config).is_ok()
    }
}
