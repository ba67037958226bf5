//! The interception engine: matching requests against mocks, consuming mocks and answering with
//! synthesized responses.

pub mod cookies;
pub mod error;
pub mod matchers;
pub mod registry;
pub mod response;
pub mod transport;
