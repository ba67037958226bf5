use crate::{
    common::data::{InterceptedRequest, MockRequestSpec},
    intercept::{
        error::MatchError,
        matchers::{comparators::ValueComparator, Matcher},
    },
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchingStrategy {
    Presence,
    Absence,
}

fn keys_equal(case_sensitive: bool, a: &str, b: &str) -> bool {
    match case_sensitive {
        true => a == b,
        false => a.eq_ignore_ascii_case(b),
    }
}

// ************************************************************************************************
// KeyValueMatcher
// ************************************************************************************************

/// Matches declared `key -> [values]` pairs (headers, query parameters, form fields). Every
/// declared key must be satisfied by at least one actual value matching at least one declared
/// value. Keys the mock does not declare are ignored.
pub(crate) struct KeyValueMatcher {
    pub name: &'static str,
    pub entity_name: &'static str,
    pub case_sensitive_keys: bool,
    pub expectation: for<'a> fn(&'a MockRequestSpec) -> &'a BTreeMap<String, Vec<String>>,
    pub request_value: fn(&InterceptedRequest) -> Vec<(String, String)>,
    pub value_comparator: Box<dyn ValueComparator<str, str> + Send + Sync>,
}

impl Matcher for KeyValueMatcher {
    fn name(&self) -> &str {
        self.name
    }

    fn mismatch(&self, req: &InterceptedRequest, spec: &MockRequestSpec) -> Option<MatchError> {
        let expected = (self.expectation)(spec);
        if expected.is_empty() {
            return None;
        }

        let received = (self.request_value)(req);

        let failures: Vec<String> = expected
            .iter()
            .filter_map(|(key, expected_values)| {
                let received_values: Vec<&str> = received
                    .iter()
                    .filter(|(k, _)| keys_equal(self.case_sensitive_keys, k, key))
                    .map(|(_, v)| v.as_str())
                    .collect();

                let matched = received_values.iter().any(|actual| {
                    expected_values
                        .iter()
                        .any(|expected| self.value_comparator.matches(expected, actual))
                });

                match matched {
                    true => None,
                    false => Some(format!(
                        "received {} '{}' with values {:?} did not match expected values {:?}",
                        self.entity_name, key, received_values, expected_values
                    )),
                }
            })
            .collect();

        if failures.is_empty() {
            return None;
        }

        Some(MatchError::new(self.name, failures.join("; ")))
    }
}

// ************************************************************************************************
// PresenceMatcher
// ************************************************************************************************

/// Checks that the declared keys are present (or absent) regardless of their values.
pub(crate) struct PresenceMatcher {
    pub name: &'static str,
    pub entity_name: &'static str,
    pub strategy: MatchingStrategy,
    pub case_sensitive_keys: bool,
    pub expectation: for<'a> fn(&'a MockRequestSpec) -> &'a Vec<String>,
    pub request_keys: fn(&InterceptedRequest) -> Vec<String>,
}

impl Matcher for PresenceMatcher {
    fn name(&self) -> &str {
        self.name
    }

    fn mismatch(&self, req: &InterceptedRequest, spec: &MockRequestSpec) -> Option<MatchError> {
        let expected = (self.expectation)(spec);
        if expected.is_empty() {
            return None;
        }

        let received = (self.request_keys)(req);

        let failures: Vec<String> = expected
            .iter()
            .filter_map(|key| {
                let present = received
                    .iter()
                    .any(|k| keys_equal(self.case_sensitive_keys, k, key));

                match (self.strategy, present) {
                    (MatchingStrategy::Presence, false) => {
                        Some(format!("expected {} '{}' was not present", self.entity_name, key))
                    }
                    (MatchingStrategy::Absence, true) => {
                        Some(format!("unexpected {} '{}' was present", self.entity_name, key))
                    }
                    _ => None,
                }
            })
            .collect();

        if failures.is_empty() {
            return None;
        }

        Some(MatchError::new(self.name, failures.join("; ")))
    }
}
