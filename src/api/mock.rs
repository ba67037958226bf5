use crate::{
    common::{
        data::{
            BodySpec, Cookie, InterceptedExchange, MockDefinition, MockRequestSpec,
            MockResponseTemplate,
        },
        http::HttpClient,
        util::normalize_header_key,
    },
    intercept::{
        matchers::{self, Matcher},
        transport::{install_interceptor, InterceptorGuard, Observer},
    },
};
use bytes::Bytes;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc, time::Duration};

/// Creates a new, empty [`Mock`].
pub fn mock() -> Mock {
    Mock::new()
}

/// A single expected outbound call and the response it is answered with.
///
/// A mock is declared in three steps: pick the method and URL (which yields a [`MockRequest`]),
/// describe what the request must look like, then describe the response
/// ([`MockRequest::respond_with`] yields a [`MockResponse`]). [`MockResponse::end`] hands the
/// finished mock back so it can be installed.
///
/// # Example
/// ```rust
/// use httpstub::prelude::*;
///
/// let mock = mock()
///     .get("http://example.com/user/12345")
///     .header("Authorization", "Bearer abc")
///     .respond_with()
///     .status(200)
///     .json_body(serde_json::json!({ "name": "jon" }))
///     .end();
/// ```
#[derive(Clone)]
pub struct Mock {
    definition: MockDefinition,
    http_client: Option<HttpClient>,
    debug: bool,
}

impl Mock {
    pub fn new() -> Self {
        Self {
            definition: MockDefinition::new(
                MockRequestSpec {
                    matchers: matchers::defaults(),
                    ..Default::default()
                },
                MockResponseTemplate::new(),
            ),
            http_client: None,
            debug: false,
        }
    }

    /// The client [`MockResponse::end_standalone`] intercepts. Without one, the process-wide
    /// default transport is intercepted.
    pub fn http_client(mut self, client: &HttpClient) -> Self {
        self.http_client = Some(client.clone());
        self
    }

    /// Dumps intercepted traffic when installed through [`MockResponse::end_standalone`].
    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    pub fn get<IntoString: Into<String>>(self, url: IntoString) -> MockRequest {
        self.request("GET", url)
    }

    pub fn post<IntoString: Into<String>>(self, url: IntoString) -> MockRequest {
        self.request("POST", url)
    }

    pub fn put<IntoString: Into<String>>(self, url: IntoString) -> MockRequest {
        self.request("PUT", url)
    }

    pub fn delete<IntoString: Into<String>>(self, url: IntoString) -> MockRequest {
        self.request("DELETE", url)
    }

    pub fn patch<IntoString: Into<String>>(self, url: IntoString) -> MockRequest {
        self.request("PATCH", url)
    }

    /// Expects the given method without constraining the URL.
    ///
    /// # Panics
    /// Panics if `method` is not a valid HTTP method.
    pub fn method<IntoString: Into<String>>(mut self, method: IntoString) -> MockRequest {
        self.definition.request.method = Some(parse_method(method.into()));
        MockRequest { mock: self }
    }

    /// Expects the given method and URL.
    ///
    /// The URL may be absolute (`http://example.com/path`), in which case scheme, host (with
    /// port) and path are all expected, or path only (`/path`). Query parameters in the URL
    /// are added to the query expectations. An empty URL expects nothing.
    ///
    /// # Panics
    /// Panics if `method` is not a valid HTTP method or `url` cannot be parsed.
    pub fn request<M: Into<String>, U: Into<String>>(mut self, method: M, url: U) -> MockRequest {
        parse_url(&mut self.definition.request, &url.into());
        self.method(method)
    }
}

impl Default for Mock {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Mock> for MockDefinition {
    fn from(mock: Mock) -> Self {
        mock.definition
    }
}

fn to_json_value<T: Serialize>(body: &T) -> Value {
    match serde_json::to_value(body) {
        Ok(value) => value,
        Err(err) => panic!("cannot serialize body to JSON: {}", err),
    }
}

fn parse_method(method: String) -> String {
    if let Err(err) = http::Method::from_bytes(method.as_bytes()) {
        panic!("cannot parse '{}' as an HTTP method: {}", method, err);
    }
    method
}

fn parse_url(spec: &mut MockRequestSpec, url: &str) {
    if url.is_empty() {
        return;
    }

    if url.starts_with('/') {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (url, None),
        };
        spec.path = Some(path.to_string());
        if let Some(query) = query {
            add_query(spec, form_urlencoded::parse(query.as_bytes()).into_owned());
        }
        return;
    }

    let parsed = url::Url::parse(url)
        .unwrap_or_else(|err| panic!("cannot parse mock url '{}': {}", url, err));

    spec.scheme = Some(parsed.scheme().to_string());

    if let Some(host) = parsed.host_str() {
        spec.host = Some(match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        });
    }

    // The parser turns "http://example.com" into path "/", which would pin the path.
    let after_authority = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let has_path = after_authority
        .split(|c| c == '?' || c == '#')
        .next()
        .map(|s| s.contains('/'))
        .unwrap_or(false);
    if has_path {
        spec.path = Some(parsed.path().to_string());
    }

    add_query(spec, parsed.query_pairs().into_owned());
}

fn add_query<I: Iterator<Item = (String, String)>>(spec: &mut MockRequestSpec, pairs: I) {
    for (key, value) in pairs {
        spec.query.entry(key).or_default().push(value);
    }
}

// ************************************************************************************************
// MockRequest
// ************************************************************************************************

/// Describes the request a [`Mock`] expects. Every expectation narrows which requests match;
/// a request matches only if all of them are satisfied.
pub struct MockRequest {
    mock: Mock,
}

impl MockRequest {
    fn spec(&mut self) -> &mut MockRequestSpec {
        &mut self.mock.definition.request
    }

    /// Expects a header with the given value. The value is compared exactly, and if that fails
    /// it is used as a regular expression. Calling this several times for the same header
    /// accepts any of the given values.
    ///
    /// # Panics
    /// Panics if `name` is not a valid header name.
    pub fn header<KeyString: Into<String>, ValueString: Into<String>>(
        mut self,
        name: KeyString,
        value: ValueString,
    ) -> Self {
        let key = normalize_header_key(&name.into());
        self.spec().headers.entry(key).or_default().push(value.into());
        self
    }

    pub fn headers<KeyString: Into<String>, ValueString: Into<String>>(
        mut self,
        headers: BTreeMap<KeyString, ValueString>,
    ) -> Self {
        for (name, value) in headers {
            self = self.header(name, value);
        }
        self
    }

    pub fn header_present<IntoString: Into<String>>(mut self, name: IntoString) -> Self {
        let key = normalize_header_key(&name.into());
        self.spec().header_present.push(key);
        self
    }

    pub fn header_not_present<IntoString: Into<String>>(mut self, name: IntoString) -> Self {
        let key = normalize_header_key(&name.into());
        self.spec().header_not_present.push(key);
        self
    }

    /// Expects a query parameter with the given value (exact or regular expression).
    pub fn query<KeyString: Into<String>, ValueString: Into<String>>(
        mut self,
        key: KeyString,
        value: ValueString,
    ) -> Self {
        self.spec()
            .query
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn query_params<KeyString: Into<String>, ValueString: Into<String>>(
        mut self,
        params: BTreeMap<KeyString, ValueString>,
    ) -> Self {
        for (key, value) in params {
            self = self.query(key, value);
        }
        self
    }

    /// Expects a query parameter to carry one of `values`.
    pub fn query_collection<KeyString: Into<String>, ValueString: Into<String>>(
        mut self,
        key: KeyString,
        values: Vec<ValueString>,
    ) -> Self {
        let key = key.into();
        for value in values {
            self = self.query(key.clone(), value);
        }
        self
    }

    pub fn query_present<IntoString: Into<String>>(mut self, key: IntoString) -> Self {
        self.spec().query_present.push(key.into());
        self
    }

    pub fn query_not_present<IntoString: Into<String>>(mut self, key: IntoString) -> Self {
        self.spec().query_not_present.push(key.into());
        self
    }

    /// Expects an `application/x-www-form-urlencoded` body field with the given value.
    pub fn form_field<KeyString: Into<String>, ValueString: Into<String>>(
        mut self,
        key: KeyString,
        value: ValueString,
    ) -> Self {
        self.spec()
            .form
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn form_present<IntoString: Into<String>>(mut self, key: IntoString) -> Self {
        self.spec().form_present.push(key.into());
        self
    }

    pub fn form_not_present<IntoString: Into<String>>(mut self, key: IntoString) -> Self {
        self.spec().form_not_present.push(key.into());
        self
    }

    /// Expects the request body. The body is compared as a string first, then `body` is tried
    /// as a regular expression and finally both are compared as JSON documents. Use
    /// [`MockRequest::body_matches`] or [`MockRequest::json_body`] to pick one of them
    /// explicitly.
    pub fn body<IntoString: Into<String>>(mut self, body: IntoString) -> Self {
        self.spec().body = Some(BodySpec::Literal(body.into()));
        self
    }

    pub fn body_matches<IntoRegex: Into<Regex>>(mut self, regex: IntoRegex) -> Self {
        self.spec().body = Some(BodySpec::Regex(regex.into()));
        self
    }

    /// Expects a JSON body that is structurally equal to `value`. Key order and whitespace are
    /// ignored.
    pub fn json_body<JsonValue: Into<Value>>(mut self, value: JsonValue) -> Self {
        self.spec().body = Some(BodySpec::Json(value.into()));
        self
    }

    /// Like [`MockRequest::json_body`], but takes any serializable object.
    ///
    /// # Panics
    /// Panics if `body` cannot be serialized to JSON.
    pub fn json_body_obj<T: Serialize>(self, body: &T) -> Self {
        self.json_body(to_json_value(body))
    }

    pub fn cookie<NameString: Into<String>, ValueString: Into<String>>(
        mut self,
        name: NameString,
        value: ValueString,
    ) -> Self {
        self.spec().cookies.push(Cookie::new(name).value(value));
        self
    }

    /// Expects cookies described field by field. Fields a [`Cookie`] does not set are ignored.
    pub fn cookies(mut self, cookies: Vec<Cookie>) -> Self {
        self.spec().cookies.extend(cookies);
        self
    }

    pub fn cookie_present<IntoString: Into<String>>(mut self, name: IntoString) -> Self {
        self.spec().cookie_present.push(name.into());
        self
    }

    pub fn cookie_not_present<IntoString: Into<String>>(mut self, name: IntoString) -> Self {
        self.spec().cookie_not_present.push(name.into());
        self
    }

    /// Appends a custom matcher. It runs after all built-in matchers.
    ///
    /// # Example
    /// ```rust
    /// use httpstub::prelude::*;
    ///
    /// let mock = mock()
    ///     .get("/orders")
    ///     .add_matcher(FunctionMatcher::new("tenant", |req, _| {
    ///         match req.header_values("x-tenant").is_empty() {
    ///             true => Err("no tenant header".to_string()),
    ///             false => Ok(()),
    ///         }
    ///     }))
    ///     .respond_with()
    ///     .end();
    /// ```
    pub fn add_matcher<M: Matcher + Send + Sync + 'static>(mut self, matcher: M) -> Self {
        self.spec().matchers.push(Arc::new(matcher));
        self
    }

    pub fn respond_with(self) -> MockResponse {
        MockResponse { mock: self.mock }
    }
}

// ************************************************************************************************
// MockResponse
// ************************************************************************************************

/// Describes the response a [`Mock`] answers with.
pub struct MockResponse {
    mock: Mock,
}

impl MockResponse {
    fn template(&mut self) -> &mut MockResponseTemplate {
        &mut self.mock.definition.response
    }

    /// # Panics
    /// Panics if `status` is not a valid HTTP status code.
    pub fn status(mut self, status: u16) -> Self {
        if let Err(err) = http::StatusCode::from_u16(status) {
            panic!("cannot use {} as status code: {}", status, err);
        }
        self.template().status = status;
        self
    }

    /// # Panics
    /// Panics if `name` is not a valid header name.
    pub fn header<KeyString: Into<String>, ValueString: Into<String>>(
        mut self,
        name: KeyString,
        value: ValueString,
    ) -> Self {
        let key = normalize_header_key(&name.into());
        self.template().headers.push((key, value.into()));
        self
    }

    pub fn headers<KeyString: Into<String>, ValueString: Into<String>>(
        mut self,
        headers: BTreeMap<KeyString, ValueString>,
    ) -> Self {
        for (name, value) in headers {
            self = self.header(name, value);
        }
        self
    }

    pub fn cookie<NameString: Into<String>, ValueString: Into<String>>(
        mut self,
        name: NameString,
        value: ValueString,
    ) -> Self {
        self.template().cookies.push(Cookie::new(name).value(value));
        self
    }

    pub fn cookies(mut self, cookies: Vec<Cookie>) -> Self {
        self.template().cookies.extend(cookies);
        self
    }

    /// Sets the response body. Unless a `content-type` header is set, it is inferred from the
    /// body: `application/json` if the body is valid JSON, `text/plain` otherwise.
    pub fn body<IntoBytes: Into<Bytes>>(mut self, body: IntoBytes) -> Self {
        self.template().body = body.into();
        self
    }

    pub fn json_body<JsonValue: Into<Value>>(mut self, body: JsonValue) -> Self {
        self.template().body = Bytes::from(body.into().to_string());
        self
    }

    /// Responds with `body` serialized to JSON.
    ///
    /// # Panics
    /// Panics if `body` cannot be serialized to JSON.
    pub fn json_body_obj<T: Serialize>(self, body: &T) -> Self {
        self.json_body(to_json_value(body))
    }

    /// Holds the response back for `delay` before it is returned. The wait is cancelled when
    /// the calling future is dropped, e.g. by a client timeout.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.template().delay = Some(delay);
        self
    }

    /// How many requests this mock answers. Defaults to 1.
    pub fn times(mut self, times: usize) -> Self {
        self.template().times = times;
        self
    }

    pub fn end(self) -> Mock {
        self.mock
    }

    /// Installs this mock together with `others` right away. The client and debug settings of
    /// this mock are used for the installation.
    pub fn end_standalone(self, others: Vec<Mock>) -> InterceptorGuard {
        let mock = self.end();
        let http_client = mock.http_client.clone();
        let debug = mock.debug;

        let mut mocks = vec![mock];
        mocks.extend(others);

        let mut standalone = StandaloneMocks::new(mocks);
        if let Some(client) = &http_client {
            standalone = standalone.http_client(client);
        }
        if debug {
            standalone = standalone.debug();
        }
        standalone.end()
    }
}

// ************************************************************************************************
// StandaloneMocks
// ************************************************************************************************

/// Installs a list of mocks outside of any test harness.
///
/// # Example
/// ```rust
/// use httpstub::prelude::*;
///
/// let client = HttpClient::new();
/// let guard = StandaloneMocks::new(vec![
///     mock().get("http://example.com/health").respond_with().status(204).end(),
/// ])
/// .http_client(&client)
/// .end();
///
/// // ... exercise code that uses `client` ...
///
/// guard.release();
/// ```
pub struct StandaloneMocks {
    mocks: Vec<Mock>,
    http_client: Option<HttpClient>,
    observer: Option<Observer>,
    debug: bool,
}

impl StandaloneMocks {
    pub fn new(mocks: Vec<Mock>) -> Self {
        Self {
            mocks,
            http_client: None,
            observer: None,
            debug: false,
        }
    }

    pub fn http_client(mut self, client: &HttpClient) -> Self {
        self.http_client = Some(client.clone());
        self
    }

    /// Called with every intercepted exchange, including requests no mock matched.
    pub fn observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&InterceptedExchange) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    pub fn end(self) -> InterceptorGuard {
        install_interceptor(
            self.mocks,
            self.http_client.as_ref(),
            self.observer,
            self.debug,
        )
    }
}
