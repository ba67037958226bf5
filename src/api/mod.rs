pub use mock::{mock, Mock, MockRequest, MockResponse, StandaloneMocks};

mod mock;
