use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid status code: {0}")]
    InvalidStatusCode(#[from] http::status::InvalidStatusCode),
    #[error("cannot build response: {0}")]
    ResponseBuildError(#[from] http::Error),
}

/// Why a single matcher rejected a request.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchError {
    /// Name of the matcher that produced this error.
    pub matcher: String,
    pub message: String,
    /// Line diff between expected and actual value, rendered with `-`/`+` prefixes.
    pub diff: Option<String>,
}

impl MatchError {
    pub fn new<N: Into<String>, M: Into<String>>(matcher: N, message: M) -> Self {
        Self {
            matcher: matcher.into(),
            message: message.into(),
            diff: None,
        }
    }

    pub fn with_diff(mut self, diff: String) -> Self {
        if !diff.is_empty() {
            self.diff = Some(diff);
        }
        self
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for MatchError {}

/// Returned when no mock matched an outbound request. Explains, for every mock that was
/// evaluated, which matchers rejected the request. Mocks are numbered from 1 in the order they
/// were registered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnmatchedMockError {
    errors: BTreeMap<usize, Vec<MatchError>>,
    exhausted: BTreeSet<usize>,
}

impl UnmatchedMockError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_errors<I: IntoIterator<Item = MatchError>>(
        mut self,
        mock_number: usize,
        errors: I,
    ) -> Self {
        self.errors.entry(mock_number).or_default().extend(errors);
        self
    }

    /// Records a mock that was skipped because it has no remaining uses.
    pub fn add_exhausted(mut self, mock_number: usize) -> Self {
        self.exhausted.insert(mock_number);
        self
    }

    pub fn errors(&self) -> &BTreeMap<usize, Vec<MatchError>> {
        &self.errors
    }

    pub fn errors_for(&self, mock_number: usize) -> Option<&Vec<MatchError>> {
        self.errors.get(&mock_number)
    }

    pub fn exhausted(&self) -> &BTreeSet<usize> {
        &self.exhausted
    }

    pub fn ordered_mock_keys(&self) -> Vec<usize> {
        let keys: BTreeSet<usize> = self
            .errors
            .keys()
            .chain(self.exhausted.iter())
            .copied()
            .collect();
        keys.into_iter().collect()
    }
}

impl fmt::Display for UnmatchedMockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "received request did not match any mocks")?;
        writeln!(f)?;

        for mock_number in self.ordered_mock_keys() {
            if self.exhausted.contains(&mock_number) {
                writeln!(f, "Mock {} is exhausted (no remaining uses)", mock_number)?;
                writeln!(f)?;
                continue;
            }

            writeln!(f, "Mock {} mismatches:", mock_number)?;
            for err in self.errors.get(&mock_number).into_iter().flatten() {
                writeln!(f, "• {}", err)?;
                if let Some(diff) = &err.diff {
                    for line in diff.lines() {
                        writeln!(f, "    {}", line)?;
                    }
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl std::error::Error for UnmatchedMockError {}
