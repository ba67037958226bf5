use crate::{
    common::{
        data::{InterceptedExchange, InterceptedRequest, InterceptedResponse, MockDefinition},
        http::{replace_default_transport, HttpClient, Transport, TransportError, TransportRef},
        util::read_env_flag,
    },
    intercept::{registry::MockRegistry, response::synthesize},
};
use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use std::{
    io::Write,
    sync::{Arc, Mutex, MutexGuard},
};

/// Environment variable that turns on wire dumps for every interceptor.
pub const DEBUG_ENV_VAR: &str = "HTTPSTUB_DEBUG";

/// Receives every intercepted exchange, matched or not.
pub type Observer = Arc<dyn Fn(&InterceptedExchange) + Send + Sync>;

/// Where wire dumps are written to.
pub type DebugSink = Arc<Mutex<dyn Write + Send>>;

lazy_static! {
    // Serializes installations on the process-wide default transport.
    static ref DEFAULT_TRANSPORT_LOCK: Mutex<()> = Mutex::new(());
}

// ************************************************************************************************
// Interceptor
// ************************************************************************************************

/// A [`Transport`] that answers requests from a list of mocks instead of the network.
pub struct Interceptor {
    registry: Arc<MockRegistry>,
    observer: Option<Observer>,
    debug: Option<DebugSink>,
}

impl Interceptor {
    pub fn new<M: Into<MockDefinition>>(mocks: Vec<M>) -> Self {
        Self {
            registry: Arc::new(MockRegistry::new(mocks.into_iter().map(Into::into).collect())),
            observer: None,
            debug: None,
        }
    }

    pub fn builder() -> InterceptorBuilder {
        InterceptorBuilder::default()
    }

    pub fn registry(&self) -> &Arc<MockRegistry> {
        &self.registry
    }

    fn observe(&self, request: &InterceptedRequest, response: Option<InterceptedResponse>) {
        if let Some(observer) = &self.observer {
            observer(&InterceptedExchange {
                request: request.clone(),
                response,
            });
        }
    }

    fn dump(&self, title: &str, text: String) {
        if let Some(sink) = &self.debug {
            let mut sink = sink.lock().unwrap_or_else(|err| err.into_inner());
            // A broken debug sink must not fail the request.
            let _ = writeln!(sink, "{}\n\n{}\n", title, text);
        }
    }
}

fn dump_request(req: &InterceptedRequest) -> String {
    let mut text = format!("{} {} {}", req.method_str(), req.uri_str(), req.version_ref());
    for (name, value) in req.headers_vec() {
        text.push_str(&format!("\n{}: {}", name, value));
    }
    if !req.body().is_empty() {
        text.push_str(&format!("\n\n{}", req.body_string()));
    }
    text
}

fn dump_response(res: &InterceptedResponse) -> String {
    let mut text = format!("HTTP/1.1 {}", res.status);
    for (name, value) in &res.headers {
        text.push_str(&format!("\n{}: {}", name, value));
    }
    if !res.body.is_empty() {
        text.push_str(&format!("\n\n{}", res.body_string()));
    }
    text
}

#[async_trait]
impl Transport for Interceptor {
    async fn send(&self, req: Request<Bytes>) -> Result<Response<Bytes>, TransportError> {
        let intercepted = InterceptedRequest::from(&req);

        self.dump("--> request to mock", dump_request(&intercepted));

        let template = match self.registry.find_and_consume(&intercepted) {
            Ok(template) => template,
            Err(unmatched) => {
                self.dump(
                    "<-- response from mock",
                    format!("failed to match mocks. Errors: {}", unmatched),
                );
                self.observe(&intercepted, None);
                return Err(TransportError::Unmatched(unmatched));
            }
        };

        let response = match synthesize(&template) {
            Ok(response) => response,
            Err(err) => {
                self.observe(&intercepted, None);
                return Err(TransportError::Interception(err.to_string()));
            }
        };

        let snapshot = InterceptedResponse::from(&response);
        self.dump("<-- response from mock", dump_response(&snapshot));
        self.observe(&intercepted, Some(snapshot));

        if let Some(delay) = template.delay {
            tracing::debug!("Delaying mock response by {:?}", delay);
            tokio::time::sleep(delay).await;
        }

        Ok(response)
    }
}

// ************************************************************************************************
// InterceptorBuilder
// ************************************************************************************************

#[derive(Default)]
pub struct InterceptorBuilder {
    mocks: Vec<MockDefinition>,
    client: Option<HttpClient>,
    observer: Option<Observer>,
    debug: bool,
    debug_sink: Option<DebugSink>,
}

impl InterceptorBuilder {
    pub fn mock<M: Into<MockDefinition>>(mut self, mock: M) -> Self {
        self.mocks.push(mock.into());
        self
    }

    pub fn mocks<M: Into<MockDefinition>>(mut self, mocks: Vec<M>) -> Self {
        self.mocks.extend(mocks.into_iter().map(Into::into));
        self
    }

    /// Intercepts this client only. Without a client, the process-wide default transport is
    /// intercepted.
    pub fn http_client(mut self, client: &HttpClient) -> Self {
        self.client = Some(client.clone());
        self
    }

    pub fn observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&InterceptedExchange) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub(crate) fn observer_ref(mut self, observer: Option<Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Dumps every intercepted request and synthesized response. Dumps go to stderr unless a
    /// sink is set with [`InterceptorBuilder::debug_sink`].
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn debug_sink(mut self, sink: DebugSink) -> Self {
        self.debug_sink = Some(sink);
        self
    }

    pub fn build(self) -> Interceptor {
        let debug = match (self.debug || read_env_flag(DEBUG_ENV_VAR), self.debug_sink) {
            (true, Some(sink)) => Some(sink),
            (true, None) => Some(Arc::new(Mutex::new(std::io::stderr())) as DebugSink),
            (false, _) => None,
        };

        Interceptor {
            registry: Arc::new(MockRegistry::new(self.mocks)),
            observer: self.observer,
            debug,
        }
    }

    /// Builds the interceptor and installs it. The returned guard restores the original
    /// transport when released or dropped.
    pub fn install(mut self) -> InterceptorGuard {
        let client = self.client.take();
        let interceptor = self.build();
        InterceptorGuard::install(interceptor, client)
    }
}

/// Installs `mocks` on `client`, or on the process-wide default transport when `client` is
/// `None`.
pub fn install_interceptor<M: Into<MockDefinition>>(
    mocks: Vec<M>,
    client: Option<&HttpClient>,
    observer: Option<Observer>,
    debug: bool,
) -> InterceptorGuard {
    let mut builder = Interceptor::builder()
        .mocks(mocks)
        .observer_ref(observer)
        .debug(debug);

    if let Some(client) = client {
        builder = builder.http_client(client);
    }

    builder.install()
}

// ************************************************************************************************
// InterceptorGuard
// ************************************************************************************************

enum InstallTarget {
    Client {
        client: HttpClient,
        previous: Option<TransportRef>,
    },
    Default {
        previous: TransportRef,
    },
}

/// Keeps an interceptor installed. Dropping the guard, including during a panic, restores the
/// transport that was active before.
///
/// Installing on the default transport blocks while another guard for the default transport is
/// alive, so tests relying on it run one after another. Dropping a guard before installing the
/// next one on the same thread is required to avoid a deadlock.
pub struct InterceptorGuard {
    registry: Arc<MockRegistry>,
    target: Option<InstallTarget>,
    default_lock: Option<MutexGuard<'static, ()>>,
}

impl InterceptorGuard {
    fn install(interceptor: Interceptor, client: Option<HttpClient>) -> Self {
        let registry = interceptor.registry.clone();
        let mock_count = registry.len();
        let interceptor: TransportRef = Arc::new(interceptor);

        let (target, default_lock) = match client {
            Some(client) => {
                let previous = client.replace_transport(Some(interceptor));
                tracing::debug!("Installed interceptor with {} mocks on client", mock_count);
                (InstallTarget::Client { client, previous }, None)
            }
            None => {
                let lock = DEFAULT_TRANSPORT_LOCK
                    .lock()
                    .unwrap_or_else(|err| err.into_inner());
                let previous = replace_default_transport(interceptor);
                tracing::debug!(
                    "Installed interceptor with {} mocks on the default transport",
                    mock_count
                );
                (InstallTarget::Default { previous }, Some(lock))
            }
        };

        Self {
            registry,
            target: Some(target),
            default_lock,
        }
    }

    pub fn registry(&self) -> &MockRegistry {
        &self.registry
    }

    /// Restores the original transport.
    pub fn release(mut self) {
        self.restore();
    }

    /// Panics if any mock still has remaining uses.
    pub fn assert_all_consumed(&self) {
        let unconsumed = self.registry.unconsumed();
        if !unconsumed.is_empty() {
            panic!(
                "{} of {} mocks were not consumed, positions: {:?}",
                unconsumed.len(),
                self.registry.len(),
                unconsumed
            );
        }
    }

    fn restore(&mut self) {
        match self.target.take() {
            Some(InstallTarget::Client { client, previous }) => {
                client.replace_transport(previous);
                tracing::debug!("Released interceptor from client");
            }
            Some(InstallTarget::Default { previous }) => {
                replace_default_transport(previous);
                tracing::debug!("Released interceptor from the default transport");
            }
            None => {}
        }

        self.default_lock.take();
    }
}

impl Drop for InterceptorGuard {
    fn drop(&mut self) {
        self.restore();
    }
}
