use crate::{
    common::data::{InterceptedRequest, MockDefinition, MockResponseTemplate},
    intercept::{error::UnmatchedMockError, matchers},
};
use std::sync::Mutex;

/// A registered mock together with its number of remaining uses.
#[derive(Debug)]
struct ActiveMock {
    /// 1-based registration position.
    position: usize,
    definition: MockDefinition,
    remaining: usize,
}

/// Holds the mocks of one interceptor installation and decides which of them answers a request.
///
/// Lookup and consumption happen under a single lock, so a mock with one remaining use can be
/// won by exactly one of several concurrent requests.
pub struct MockRegistry {
    state: Mutex<Vec<ActiveMock>>,
}

impl MockRegistry {
    pub fn new(definitions: Vec<MockDefinition>) -> Self {
        let mocks = definitions
            .into_iter()
            .enumerate()
            .map(|(idx, definition)| ActiveMock {
                position: idx + 1,
                remaining: definition.response.times,
                definition,
            })
            .collect();

        Self {
            state: Mutex::new(mocks),
        }
    }

    /// Finds the first mock (in registration order) that matches `req` and still has uses
    /// left, consumes one use and returns its response template. When no mock matches, the
    /// returned error explains why each of them was rejected.
    pub fn find_and_consume(
        &self,
        req: &InterceptedRequest,
    ) -> Result<MockResponseTemplate, UnmatchedMockError> {
        let mut state = self.state.lock().unwrap_or_else(|err| err.into_inner());
        let mut unmatched = UnmatchedMockError::new();

        for mock in state.iter_mut() {
            if mock.remaining == 0 {
                unmatched = unmatched.add_exhausted(mock.position);
                continue;
            }

            let mismatches = matchers::mismatches(req, &mock.definition.request);
            if mismatches.is_empty() {
                mock.remaining -= 1;

                tracing::debug!(
                    "Matched mock {} to request {} {} ({} uses left)",
                    mock.position,
                    req.method_str(),
                    req.uri_str(),
                    mock.remaining
                );

                return Ok(mock.definition.response.clone());
            }

            unmatched = unmatched.add_errors(mock.position, mismatches);
        }

        tracing::debug!(
            "Could not match any of {} mocks to request {} {} ({} mocks with mismatches)",
            state.len(),
            req.method_str(),
            req.uri_str(),
            unmatched.errors().len()
        );

        Err(unmatched)
    }

    /// Remaining uses of the mock at the 1-based `position`.
    pub fn remaining(&self, position: usize) -> Option<usize> {
        let state = self.state.lock().unwrap_or_else(|err| err.into_inner());
        state
            .iter()
            .find(|m| m.position == position)
            .map(|m| m.remaining)
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(|err| err.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all_consumed(&self) -> bool {
        self.unconsumed().is_empty()
    }

    /// Positions of the mocks that still have remaining uses.
    pub fn unconsumed(&self) -> Vec<usize> {
        let state = self.state.lock().unwrap_or_else(|err| err.into_inner());
        state
            .iter()
            .filter(|m| m.remaining > 0)
            .map(|m| m.position)
            .collect()
    }
}
