use crate::{
    common::{
        data::{BodySpec, InterceptedRequest, MockRequestSpec},
        util::matches_exact_or_regex,
    },
    intercept::{
        error::MatchError,
        matchers::{
            comparators::{JSONExactMatchComparator, ValueComparator},
            diff_str, Matcher,
        },
    },
};
use serde_json::Value;

/// Matches the request body in three tiers for literal bodies: exact string, regular
/// expression, structural JSON equality. Regex and JSON bodies only use their own tier.
pub(crate) struct BodyMatcher {
    json_comparator: JSONExactMatchComparator,
}

impl BodyMatcher {
    pub fn new() -> Self {
        Self {
            json_comparator: JSONExactMatchComparator::new(),
        }
    }

    fn json_equals(&self, expected: &Value, actual: &[u8]) -> bool {
        serde_json::from_slice::<Value>(actual)
            .map(|actual| self.json_comparator.matches(expected, &actual))
            .unwrap_or(false)
    }

    fn literal_matches(&self, expected: &str, actual: &[u8]) -> bool {
        if matches_exact_or_regex(expected, &String::from_utf8_lossy(actual)) {
            return true;
        }

        serde_json::from_str::<Value>(expected)
            .map(|expected| self.json_equals(&expected, actual))
            .unwrap_or(false)
    }
}

/// Pretty-prints JSON documents so the diff works line by line; everything else is returned as is.
fn diffable(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| body.to_string())
}

impl Matcher for BodyMatcher {
    fn name(&self) -> &str {
        "body"
    }

    fn mismatch(&self, req: &InterceptedRequest, spec: &MockRequestSpec) -> Option<MatchError> {
        let expected = spec.body.as_ref().filter(|b| !b.is_empty())?;

        if req.body().is_empty() {
            return Some(MatchError::new(
                self.name(),
                "expected a body but received none",
            ));
        }

        let actual = req.body().as_ref();
        let matched = match expected {
            BodySpec::Literal(literal) => self.literal_matches(literal, actual),
            BodySpec::Regex(regex) => regex.is_match(&String::from_utf8_lossy(actual)),
            BodySpec::Json(json) => self.json_equals(json, actual),
        };

        if matched {
            return None;
        }

        let expected = expected.to_string();
        let actual = req.body_string();
        let diff = diff_str(&diffable(&expected), &diffable(&actual));

        Some(
            MatchError::new(
                self.name(),
                format!(
                    "received body {} did not match expected mock body {}",
                    actual, expected
                ),
            )
            .with_diff(diff),
        )
    }
}
