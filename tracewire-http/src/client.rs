//! Exit-span decorator for HTTP clients.
//!
//! [`TracedClient`] wraps any [`HttpClient`] and traces each outbound
//! call: it opens an exit span named after the request, lets the tracer
//! inject propagation headers into it, hands the request to the wrapped
//! transport, and records the outcome on the span. The wrapped transport
//! performs all actual I/O.
//!
//! The decorator reads its parent [`TraceContext`] from the outgoing
//! request's extensions. Handlers running under
//! [`server::TraceLayer`](crate::server::TraceLayer) keep a trace
//! connected by copying the context from the inbound request to the
//! outbound one before sending.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};

use tracewire::trace::{tag, ComponentId, Key, Span, SpanLayer, TraceContext, Tracer};

use crate::{request_host, Error, HeaderInjector, HttpClient, HttpError};

const COMPONENT_HTTP_CLIENT: ComponentId = ComponentId::new(5005);

/// An [`HttpClient`] decorator that traces every call as an exit span.
///
/// The decorator implements [`HttpClient`] itself, so it substitutes for
/// the bare transport anywhere one is expected. Responses, bodies, and
/// transport errors pass through unchanged; failure status codes and
/// transport errors are additionally recorded on the span.
///
/// ```
/// use tracewire::trace::NoopTracer;
/// use tracewire_http::client::TracedClient;
///
/// let client = TracedClient::builder()
///     .with_tracer(NoopTracer::new())
///     .with_tag("env", "staging")
///     .build()?;
/// # Ok::<(), tracewire_http::Error>(())
/// ```
#[derive(Debug)]
pub struct TracedClient<T> {
    tracer: Arc<T>,
    operation: Option<String>,
    extra_tags: Vec<(Key, String)>,
    transport: Arc<dyn HttpClient>,
}

impl<T: Tracer> TracedClient<T> {
    /// Start assembling a traced client.
    pub fn builder() -> TracedClientBuilder<T> {
        TracedClientBuilder::default()
    }
}

#[cfg(feature = "reqwest")]
impl<T: Tracer> TracedClient<T> {
    /// Trace calls through `tracer`, delegating to a default `reqwest`
    /// client.
    pub fn new(tracer: T) -> Self {
        TracedClient {
            tracer: Arc::new(tracer),
            operation: None,
            extra_tags: Vec::new(),
            transport: Arc::new(reqwest::Client::new()),
        }
    }
}

impl<T> Clone for TracedClient<T> {
    fn clone(&self) -> Self {
        TracedClient {
            tracer: self.tracer.clone(),
            operation: self.operation.clone(),
            extra_tags: self.extra_tags.clone(),
            transport: self.transport.clone(),
        }
    }
}

/// Options for a [`TracedClient`], finalized by
/// [`build`](TracedClientBuilder::build).
#[derive(Debug)]
pub struct TracedClientBuilder<T> {
    tracer: Option<Arc<T>>,
    operation: Option<String>,
    extra_tags: Vec<(Key, String)>,
    transport: Option<Arc<dyn HttpClient>>,
}

impl<T> Default for TracedClientBuilder<T> {
    fn default() -> Self {
        TracedClientBuilder {
            tracer: None,
            operation: None,
            extra_tags: Vec::new(),
            transport: None,
        }
    }
}

impl<T: Tracer> TracedClientBuilder<T> {
    /// Tracer the exit spans are created through. Mandatory.
    pub fn with_tracer(mut self, tracer: T) -> Self {
        self.tracer = Some(Arc::new(tracer));
        self
    }

    /// Use a fixed operation name instead of deriving one per request.
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation = Some(name.into());
        self
    }

    /// Attach a tag to every span this client creates.
    pub fn with_tag(mut self, key: impl Into<Key>, value: impl Into<String>) -> Self {
        self.extra_tags.push((key.into(), value.into()));
        self
    }

    /// Delegate calls to `transport` instead of the default client.
    pub fn with_transport(mut self, transport: Arc<dyn HttpClient>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Finalize the configuration.
    ///
    /// Fails with [`Error::InvalidTracer`] when no tracer was supplied,
    /// and with [`Error::MissingTransport`] when no transport was given
    /// and the `reqwest` default is compiled out.
    pub fn build(self) -> Result<TracedClient<T>, Error> {
        let tracer = self.tracer.ok_or(Error::InvalidTracer)?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };
        Ok(TracedClient {
            tracer,
            operation: self.operation,
            extra_tags: self.extra_tags,
            transport,
        })
    }
}

#[cfg(feature = "reqwest")]
fn default_transport() -> Result<Arc<dyn HttpClient>, Error> {
    Ok(Arc::new(reqwest::Client::new()))
}

#[cfg(not(feature = "reqwest"))]
fn default_transport() -> Result<Arc<dyn HttpClient>, Error> {
    Err(Error::MissingTransport)
}

#[async_trait]
impl<T> HttpClient for TracedClient<T>
where
    T: Tracer + fmt::Debug + Send + Sync,
    T::Span: Send,
{
    async fn send(&self, mut request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
        let cx = request
            .extensions()
            .get::<TraceContext>()
            .cloned()
            .unwrap_or_default();
        let operation = match &self.operation {
            Some(operation) => operation.clone(),
            None => format!("/{}{}", request.method(), request.uri().path()),
        };
        let peer = request_host(&request).to_owned();

        let created = self.tracer.create_exit_span(
            &cx,
            &operation,
            &peer,
            &mut HeaderInjector(request.headers_mut()),
        );
        let mut span = match created {
            Ok(span) => span,
            Err(error) => {
                tracing::debug!(%error, "exit span creation failed, call left untraced");
                return self.transport.send(request).await;
            }
        };

        span.set_component(COMPONENT_HTTP_CLIENT);
        for (key, value) in &self.extra_tags {
            span.tag(key.clone(), value.clone());
        }
        span.tag(tag::HTTP_METHOD, request.method().as_str());
        span.tag(tag::URL, request.uri().to_string());
        span.set_layer(SpanLayer::Http);

        let result = self.transport.send(request).await;
        match &result {
            Ok(response) => {
                let status = response.status();
                span.tag(tag::STATUS_CODE, status.as_str());
                if status.as_u16() >= 400 {
                    span.error(
                        SystemTime::now(),
                        format!("request failed with status {status}"),
                    );
                }
            }
            Err(error) => span.error(SystemTime::now(), error.to_string()),
        }
        span.end();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tracewire::testing::trace::{RecordingTracer, SpanKind, PROPAGATION_KEY};
    use tracewire::trace::NoopTracer;

    #[derive(Debug, Default)]
    struct MockTransport {
        status: u16,
        fail: bool,
        calls: AtomicUsize,
        seen_headers: Mutex<Option<http::HeaderMap>>,
    }

    impl MockTransport {
        fn with_status(status: u16) -> Arc<Self> {
            Arc::new(MockTransport {
                status,
                ..MockTransport::default()
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(MockTransport {
                fail: true,
                ..MockTransport::default()
            })
        }
    }

    #[async_trait]
    impl HttpClient for MockTransport {
        async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_headers.lock().unwrap() = Some(request.headers().clone());
            if self.fail {
                return Err("connection refused".into());
            }
            Ok(Response::builder()
                .status(self.status)
                .body(Bytes::new())
                .unwrap())
        }
    }

    fn request(uri: &str) -> Request<Bytes> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    #[test]
    fn build_without_tracer_is_rejected() {
        let err = TracedClient::<NoopTracer>::builder()
            .with_tag("env", "staging")
            .build()
            .unwrap_err();
        assert_eq!(err, Error::InvalidTracer);
    }

    #[tokio::test]
    async fn records_exit_span_and_injects_headers() {
        let tracer = RecordingTracer::new();
        let transport = MockTransport::with_status(200);
        let client = TracedClient::builder()
            .with_tracer(tracer.clone())
            .with_tag("env", "staging")
            .with_transport(transport.clone())
            .build()
            .unwrap();

        let res = client
            .send(request("http://api.example.com/users/42"))
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        let seen = transport.seen_headers.lock().unwrap();
        let headers = seen.as_ref().unwrap();
        assert_eq!(
            headers.get(PROPAGATION_KEY).unwrap().to_str().unwrap(),
            "trace-1"
        );

        let finished = tracer.finished();
        assert_eq!(finished.len(), 1);
        let record = &finished[0];
        assert_eq!(record.kind, SpanKind::Exit);
        assert_eq!(record.operation, "/GET/users/42");
        assert_eq!(record.peer.as_deref(), Some("api.example.com"));
        assert_eq!(record.component, Some(ComponentId::new(5005)));
        assert_eq!(record.layer, Some(SpanLayer::Http));
        assert_eq!(record.tag(&Key::from_static("env")), Some("staging"));
        assert_eq!(record.tag(&tag::HTTP_METHOD), Some("GET"));
        assert_eq!(
            record.tag(&tag::URL),
            Some("http://api.example.com/users/42")
        );
        assert_eq!(record.tag(&tag::STATUS_CODE), Some("200"));
        assert!(record.errors.is_empty());
    }

    #[tokio::test]
    async fn continues_the_trace_from_request_extensions() {
        let tracer = RecordingTracer::new();
        let transport = MockTransport::with_status(200);
        let client = TracedClient::builder()
            .with_tracer(tracer.clone())
            .with_transport(transport.clone())
            .build()
            .unwrap();

        let mut req = request("http://api.example.com/users");
        req.extensions_mut().insert(TraceContext::new(
            "checkout",
            "pod-1",
            "trace-entry",
            "segment-1",
            0,
        ));
        client.send(req).await.unwrap();

        assert_eq!(tracer.finished()[0].trace_id, "trace-entry");
        let seen = transport.seen_headers.lock().unwrap();
        let headers = seen.as_ref().unwrap();
        assert_eq!(
            headers.get(PROPAGATION_KEY).unwrap().to_str().unwrap(),
            "trace-entry"
        );
    }

    #[tokio::test]
    async fn failure_status_is_tagged_and_marked() {
        let tracer = RecordingTracer::new();
        let client = TracedClient::builder()
            .with_tracer(tracer.clone())
            .with_transport(MockTransport::with_status(500))
            .build()
            .unwrap();

        let res = client
            .send(request("http://api.example.com/users"))
            .await
            .unwrap();
        assert_eq!(res.status(), 500);

        let finished = tracer.finished();
        let record = &finished[0];
        assert_eq!(record.tag(&tag::STATUS_CODE), Some("500"));
        assert_eq!(record.errors.len(), 1);
        assert_eq!(
            record.errors[0].1,
            "request failed with status 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn transport_errors_propagate_and_mark_the_span() {
        let tracer = RecordingTracer::new();
        let client = TracedClient::builder()
            .with_tracer(tracer.clone())
            .with_transport(MockTransport::failing())
            .build()
            .unwrap();

        let err = client
            .send(request("http://api.example.com/users"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "connection refused");

        let finished = tracer.finished();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].errors[0].1, "connection refused");
        assert!(finished[0].tag(&tag::STATUS_CODE).is_none());
    }

    #[tokio::test]
    async fn span_creation_failure_degrades_to_passthrough() {
        let tracer = RecordingTracer::new();
        let transport = MockTransport::with_status(200);
        let client = TracedClient::builder()
            .with_tracer(tracer.clone())
            .with_transport(transport.clone())
            .build()
            .unwrap();

        tracer.fail_span_creation(true);
        let res = client
            .send(request("http://api.example.com/users"))
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(tracer.started(), 0);
    }

    #[tokio::test]
    async fn fixed_operation_name_overrides_derivation() {
        let tracer = RecordingTracer::new();
        let client = TracedClient::builder()
            .with_tracer(tracer.clone())
            .with_operation_name("fetch-users")
            .with_transport(MockTransport::with_status(200))
            .build()
            .unwrap();

        client
            .send(request("http://api.example.com/users"))
            .await
            .unwrap();
        assert_eq!(tracer.finished()[0].operation, "fetch-users");
    }
}
