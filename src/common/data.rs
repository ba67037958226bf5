use crate::intercept::matchers::Matcher;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use headers::HeaderMapExt;
use regex::Regex;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fmt,
    fmt::{Debug, Display},
    sync::Arc,
    time::Duration,
};

// ************************************************************************************************
// Requests
// ************************************************************************************************

/// An owned snapshot of an outbound HTTP request as seen by the interceptor.
///
/// The body is fully buffered, so matchers can inspect it any number of times without
/// consuming it. The request handed to the transport is never modified.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    uri: String,
    method: String,
    headers: Vec<(String, String)>,
    version: String,
    body: Bytes,
}

impl InterceptedRequest {
    pub(crate) fn new(
        uri: String,
        method: String,
        headers: Vec<(String, String)>,
        version: String,
        body: Bytes,
    ) -> Self {
        Self {
            uri,
            method,
            headers,
            version,
            body,
        }
    }

    /// Parses and returns the URI of the request.
    ///
    /// Origin-form URIs (path and query only) are kept as they are. The host of such a request
    /// is taken from the `Host` header, see [`InterceptedRequest::authority`].
    pub fn uri(&self) -> http::Uri {
        self.uri.parse().unwrap_or_default()
    }

    pub fn uri_str(&self) -> &str {
        self.uri.as_ref()
    }

    /// The scheme of the request URI, if the URI is absolute.
    pub fn scheme(&self) -> Option<String> {
        self.uri().scheme_str().map(|s| s.to_string())
    }

    /// Returns the authority (`host[:port]`) the request was sent to. The URI authority takes
    /// precedence over the `Host` header.
    pub fn authority(&self) -> Option<String> {
        if let Some(authority) = self.uri().authority() {
            return Some(authority.as_str().to_string());
        }

        self.header_values("host").into_iter().next()
    }

    pub fn path(&self) -> String {
        self.uri().path().to_string()
    }

    pub fn method(&self) -> http::Method {
        http::Method::from_bytes(self.method.as_bytes()).unwrap_or_default()
    }

    pub fn method_str(&self) -> &str {
        self.method.as_ref()
    }

    pub fn version_ref(&self) -> &str {
        self.version.as_ref()
    }

    pub fn headers_vec(&self) -> &Vec<(String, String)> {
        self.headers.as_ref()
    }

    /// All values of the header `name`, in the order they were sent. Header names are compared
    /// case-insensitively.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.to_string())
            .collect()
    }

    pub fn query_params_vec(&self) -> Vec<(String, String)> {
        let uri = self.uri();
        form_urlencoded::parse(uri.query().unwrap_or("").as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Decodes the body as `application/x-www-form-urlencoded` key/value pairs.
    pub fn form_params_vec(&self) -> Vec<(String, String)> {
        form_urlencoded::parse(self.body.as_ref())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// The cookies sent in the `Cookie` header(s) of this request.
    pub fn cookies(&self) -> Vec<ActualCookie> {
        let mut header_map = http::HeaderMap::new();
        for (key, value) in &self.headers {
            if !key.eq_ignore_ascii_case("cookie") {
                continue;
            }
            if let Ok(value) = http::HeaderValue::from_str(value) {
                header_map.append(http::header::COOKIE, value);
            }
        }

        header_map
            .typed_get::<headers::Cookie>()
            .map(|cookie| {
                cookie
                    .iter()
                    .map(|(name, value)| ActualCookie::new(name, value))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

impl From<&http::Request<Bytes>> for InterceptedRequest {
    fn from(value: &http::Request<Bytes>) -> Self {
        // Since Bytes shares data, clone does not copy the body.
        InterceptedRequest::new(
            value.uri().to_string(),
            value.method().to_string(),
            http_headers_to_vec(value.headers()),
            format!("{:?}", value.version()),
            value.body().clone(),
        )
    }
}

/// Header values may carry obs-text bytes that are not visible ASCII. They are decoded lossily
/// so that taking a snapshot never fails.
fn http_headers_to_vec(headers: &http::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

// ************************************************************************************************
// Responses
// ************************************************************************************************

/// An owned snapshot of a synthesized response, handed to observers.
#[derive(Clone)]
pub struct InterceptedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl InterceptedResponse {
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.to_string())
            .collect()
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

impl From<&http::Response<Bytes>> for InterceptedResponse {
    fn from(value: &http::Response<Bytes>) -> Self {
        Self {
            status: value.status().as_u16(),
            headers: http_headers_to_vec(value.headers()),
            body: value.body().clone(),
        }
    }
}

/// Prints the response body as UTF8 string
impl fmt::Debug for InterceptedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptedResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body_string())
            .finish()
    }
}

/// One intercepted call as reported to an observer. `response` is `None` when no mock matched.
#[derive(Debug, Clone)]
pub struct InterceptedExchange {
    pub request: InterceptedRequest,
    pub response: Option<InterceptedResponse>,
}

// ************************************************************************************************
// Mock declarations
// ************************************************************************************************

/// What a mock expects the request body to look like.
#[derive(Debug, Clone)]
pub enum BodySpec {
    /// Exact string, then the same string as a regular expression, then structural JSON equality.
    Literal(String),
    Regex(Regex),
    Json(Value),
}

impl BodySpec {
    pub fn is_empty(&self) -> bool {
        match self {
            BodySpec::Literal(s) => s.is_empty(),
            BodySpec::Regex(r) => r.as_str().is_empty(),
            BodySpec::Json(_) => false,
        }
    }
}

impl Display for BodySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodySpec::Literal(s) => write!(f, "{}", s),
            BodySpec::Regex(r) => write!(f, "{}", r),
            BodySpec::Json(v) => write!(f, "{}", v),
        }
    }
}

/// The request side of a mock. Every field left empty means "don't care".
#[derive(Clone, Default)]
pub struct MockRequestSpec {
    pub scheme: Option<String>,
    /// Authority (`host` or `host:port`).
    pub host: Option<String>,
    pub path: Option<String>,
    pub method: Option<String>,
    pub headers: BTreeMap<String, Vec<String>>,
    pub header_present: Vec<String>,
    pub header_not_present: Vec<String>,
    pub query: BTreeMap<String, Vec<String>>,
    pub query_present: Vec<String>,
    pub query_not_present: Vec<String>,
    pub form: BTreeMap<String, Vec<String>>,
    pub form_present: Vec<String>,
    pub form_not_present: Vec<String>,
    pub body: Option<BodySpec>,
    pub cookies: Vec<Cookie>,
    pub cookie_present: Vec<String>,
    pub cookie_not_present: Vec<String>,
    pub matchers: Vec<Arc<dyn Matcher + Send + Sync>>,
}

impl Debug for MockRequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockRequestSpec")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("header_present", &self.header_present)
            .field("header_not_present", &self.header_not_present)
            .field("query", &self.query)
            .field("query_present", &self.query_present)
            .field("query_not_present", &self.query_not_present)
            .field("form", &self.form)
            .field("form_present", &self.form_present)
            .field("form_not_present", &self.form_not_present)
            .field("body", &self.body)
            .field("cookies", &self.cookies)
            .field("cookie_present", &self.cookie_present)
            .field("cookie_not_present", &self.cookie_not_present)
            .field(
                "matchers",
                &self.matchers.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// The response side of a mock.
#[derive(Debug, Clone)]
pub struct MockResponseTemplate {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<Cookie>,
    pub body: Bytes,
    pub delay: Option<Duration>,
    /// How many times the mock may be consumed.
    pub times: usize,
}

impl MockResponseTemplate {
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            cookies: Vec::new(),
            body: Bytes::new(),
            delay: None,
            times: 1,
        }
    }
}

impl Default for MockResponseTemplate {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete mock: what to expect and how to answer.
#[derive(Debug, Clone, Default)]
pub struct MockDefinition {
    pub request: MockRequestSpec,
    pub response: MockResponseTemplate,
}

impl MockDefinition {
    pub fn new(request: MockRequestSpec, response: MockResponseTemplate) -> Self {
        Self { request, response }
    }
}

// ************************************************************************************************
// Cookies
// ************************************************************************************************

/// A cookie as declared by a test author. Only the fields that were set explicitly are compared
/// against actual cookies or written into `Set-Cookie` headers.
#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    pub(crate) name: String,
    pub(crate) value: Option<String>,
    pub(crate) path: Option<String>,
    pub(crate) domain: Option<String>,
    pub(crate) expires: Option<DateTime<Utc>>,
    pub(crate) max_age: Option<i64>,
    pub(crate) secure: Option<bool>,
    pub(crate) http_only: Option<bool>,
}

impl Cookie {
    pub fn new<IntoString: Into<String>>(name: IntoString) -> Self {
        Self {
            name: name.into(),
            value: None,
            path: None,
            domain: None,
            expires: None,
            max_age: None,
            secure: None,
            http_only: None,
        }
    }

    pub fn value<IntoString: Into<String>>(mut self, value: IntoString) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn path<IntoString: Into<String>>(mut self, path: IntoString) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain<IntoString: Into<String>>(mut self, domain: IntoString) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn max_age(mut self, max_age: i64) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = Some(http_only);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A cookie as it was actually sent or received. All fields carry concrete values; attributes
/// that were not present keep their zero value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActualCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub domain: String,
    pub expires: Option<DateTime<Utc>>,
    pub max_age: i64,
    pub secure: bool,
    pub http_only: bool,
}

impl ActualCookie {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }
}
