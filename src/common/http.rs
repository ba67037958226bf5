use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, Response};
use http_body_util::{BodyExt, Full};
#[cfg(feature = "https")]
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::{
    sync::{Arc, RwLock},
    time::Duration,
};
use thiserror::Error;

use crate::intercept::error::UnmatchedMockError;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("cannot send request: {0}")]
    HyperError(#[from] hyper::Error),
    #[error("cannot send request: {0}")]
    HyperUtilError(#[from] hyper_util::client::legacy::Error),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("cannot intercept request: {0}")]
    Interception(String),
    #[error(transparent)]
    Unmatched(#[from] UnmatchedMockError),
}

/// The seam every outbound call of an [`HttpClient`] goes through. The real network transport
/// and the mock interceptor both implement it.
#[async_trait]
pub trait Transport {
    async fn send(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError>;
}

pub type TransportRef = Arc<dyn Transport + Send + Sync>;

// ************************************************************************************************
// HyperTransport
// ************************************************************************************************

/// Sends requests over the network using a pooled hyper client.
pub struct HyperTransport {
    #[cfg(feature = "https")]
    client: Arc<Client<HttpsConnector<HttpConnector>, Full<Bytes>>>,
    #[cfg(not(feature = "https"))]
    client: Arc<Client<HttpConnector, Full<Bytes>>>,
}

impl HyperTransport {
    #[cfg(feature = "https")]
    pub fn new() -> Self {
        // see https://github.com/rustls/rustls/issues/1938
        if rustls::crypto::CryptoProvider::get_default().is_none() {
            let _ = rustls::crypto::ring::default_provider().install_default();
        }

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .expect("cannot set up using native root certificates")
            .https_or_http()
            .enable_http1()
            .build();

        Self {
            client: Arc::new(Client::builder(TokioExecutor::new()).build(https_connector)),
        }
    }

    #[cfg(not(feature = "https"))]
    pub fn new() -> Self {
        Self {
            client: Arc::new(Client::builder(TokioExecutor::new()).build(HttpConnector::new())),
        }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError> {
        let (req_parts, req_body) = req.into_parts();
        let hyper_req = Request::from_parts(req_parts, Full::new(req_body));

        let res = self.client.request(hyper_req).await?;

        let (res_parts, res_body) = res.into_parts();
        let body = res_body.collect().await?.to_bytes();

        Ok(Response::from_parts(res_parts, body))
    }
}

// ************************************************************************************************
// Process-wide default transport
// ************************************************************************************************

lazy_static! {
    static ref DEFAULT_TRANSPORT: RwLock<Option<TransportRef>> = RwLock::new(None);
}

/// Returns the transport used by every [`HttpClient`] that was not given its own transport.
pub fn default_transport() -> TransportRef {
    let mut slot = DEFAULT_TRANSPORT
        .write()
        .unwrap_or_else(|err| err.into_inner());

    slot.get_or_insert_with(|| Arc::new(HyperTransport::new()))
        .clone()
}

/// Replaces the process-wide default transport and returns the one that was active before.
pub(crate) fn replace_default_transport(transport: TransportRef) -> TransportRef {
    let mut slot = DEFAULT_TRANSPORT
        .write()
        .unwrap_or_else(|err| err.into_inner());

    let previous = slot
        .take()
        .unwrap_or_else(|| Arc::new(HyperTransport::new()));
    *slot = Some(transport);
    previous
}

// ************************************************************************************************
// HttpClient
// ************************************************************************************************

/// A cheaply cloneable HTTP client whose transport can be swapped out at runtime.
///
/// All clones share the same transport slot, so installing an interceptor on one clone affects
/// every clone handed to the system under test. A client without its own transport uses the
/// process-wide [`default_transport`].
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<RwLock<Option<TransportRef>>>,
    timeout: Option<Duration>,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn with_transport(transport: TransportRef) -> Self {
        Self::builder().transport(transport).build()
    }

    /// The transport this client currently sends requests through.
    pub fn transport(&self) -> TransportRef {
        let slot = self.transport.read().unwrap_or_else(|err| err.into_inner());
        match slot.as_ref() {
            Some(transport) => transport.clone(),
            None => default_transport(),
        }
    }

    /// Swaps the client-specific transport and returns the previous one. `None` means the
    /// client falls back to the process-wide default.
    pub(crate) fn replace_transport(
        &self,
        transport: Option<TransportRef>,
    ) -> Option<TransportRef> {
        let mut slot = self
            .transport
            .write()
            .unwrap_or_else(|err| err.into_inner());
        std::mem::replace(&mut *slot, transport)
    }

    pub async fn send(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError> {
        let transport = self.transport();

        tracing::trace!("Sending {} {}", req.method(), req.uri());

        match self.timeout {
            None => transport.send(req).await,
            Some(duration) => tokio::time::timeout(duration, transport.send(req))
                .await
                .map_err(|_| TransportError::Timeout(duration))?,
        }
    }

    pub async fn get(&self, uri: &str) -> Result<Response<Bytes>, TransportError> {
        self.request(Method::GET, uri, Vec::new(), Bytes::new())
            .await
    }

    pub async fn post<B: Into<Bytes>>(
        &self,
        uri: &str,
        body: B,
    ) -> Result<Response<Bytes>, TransportError> {
        self.request(Method::POST, uri, Vec::new(), body.into())
            .await
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        headers: Vec<(&str, &str)>,
        body: Bytes,
    ) -> Result<Response<Bytes>, TransportError> {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        let req = builder
            .body(body)
            .map_err(|err| TransportError::InvalidRequest(err.to_string()))?;

        self.send(req).await
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
pub struct HttpClientBuilder {
    transport: Option<TransportRef>,
    timeout: Option<Duration>,
}

impl HttpClientBuilder {
    pub fn transport(mut self, transport: TransportRef) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Bounds every call, including any delay a mock introduces.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> HttpClient {
        HttpClient {
            transport: Arc::new(RwLock::new(self.transport)),
            timeout: self.timeout,
        }
    }
}
