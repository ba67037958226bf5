//! `httpstub` intercepts the outbound HTTP calls of a system under test and answers them with
//! mocked responses, so tests never reach a real network.
//!
//! Mocks are declared with a fluent builder. Each mock describes a request it expects (method,
//! URL, headers, query parameters, form fields, body, cookies, or any custom matcher) and the
//! response it answers with. Once installed, every request sent through an [`HttpClient`] is
//! matched against the mocks in the order they were declared. The first mock that matches all
//! of its expectations answers the request and one of its uses is consumed.
//!
//! If no mock matches, the request fails with an [`UnmatchedMockError`] that lists, for every
//! mock, why it was rejected.
//!
//! # Getting Started
//! ```rust
//! use httpstub::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = HttpClient::new();
//!
//!     let guard = Interceptor::builder()
//!         .mock(
//!             mock()
//!                 .get("http://example.com/user/12345")
//!                 .respond_with()
//!                 .status(200)
//!                 .json_body(serde_json::json!({ "name": "jon" }))
//!                 .end(),
//!         )
//!         .http_client(&client)
//!         .install();
//!
//!     let response = client.get("http://example.com/user/12345").await.unwrap();
//!
//!     assert_eq!(response.status(), 200);
//!     assert_eq!(response.body().as_ref(), br#"{"name":"jon"}"#);
//!
//!     guard.assert_all_consumed();
//! }
//! ```
//!
//! # Installation
//! An interceptor can be installed on a specific [`HttpClient`] (and all of its clones) or on
//! the process-wide default transport that every client without its own transport uses.
//! Installing on a dedicated client is preferred: installations on the default transport are
//! serialized through a global lock, so tests relying on it run one after another.
//!
//! The [`InterceptorGuard`] returned by the installation restores the original transport when
//! it is released or dropped.
//!
//! # Debugging
//! Setting `debug(true)` on the builder, or the environment variable `HTTPSTUB_DEBUG=true`,
//! prints every intercepted request and the mocked response to stderr.
#[macro_use]
extern crate lazy_static;

mod api;
mod common;
mod intercept;

pub use http::Method;

pub use api::{mock, Mock, MockRequest, MockResponse, StandaloneMocks};
pub use common::{
    data::{
        ActualCookie, BodySpec, Cookie, InterceptedExchange, InterceptedRequest,
        InterceptedResponse, MockDefinition, MockRequestSpec, MockResponseTemplate,
    },
    http::{
        default_transport, HttpClient, HttpClientBuilder, HyperTransport, Transport,
        TransportError, TransportRef,
    },
};
pub use intercept::{
    cookies::{compare_cookies, parse_set_cookie, to_set_cookie},
    error::{Error as ResponseError, MatchError, UnmatchedMockError},
    matchers::{defaults as default_matchers, FunctionMatcher, Matcher, MatcherRef},
    registry::MockRegistry,
    response::synthesize,
    transport::{
        install_interceptor, DebugSink, Interceptor, InterceptorBuilder, InterceptorGuard,
        Observer, DEBUG_ENV_VAR,
    },
};

pub mod prelude {
    #[doc(no_inline)]
    pub use crate::{
        mock, Cookie, FunctionMatcher, HttpClient, InterceptedExchange, InterceptedRequest,
        Interceptor, InterceptorGuard, Matcher, Method, Mock, MockRequestSpec, StandaloneMocks,
        TransportError, UnmatchedMockError,
    };
}
