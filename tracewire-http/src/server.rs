//! Entry-span middleware for [`tower_service::Service`] stacks.
//!
//! [`TraceLayer`] instruments the server side of a process: every inbound
//! request gets an entry span named after its method and path, tagged
//! with the request host and URL, and linked to the caller's trace
//! through the incoming propagation headers. The context returned by the
//! tracer is stored in the request's extensions so handlers, outbound
//! clients, and log lines can reach it.
//!
//! The middleware is transparent. A disabled layer, a missing tracer, or
//! a failed span creation all leave the wrapped service's behavior
//! untouched, and handler responses and errors pass through unmodified.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::SystemTime;

use http::{Request, Response};
use pin_project_lite::pin_project;
use tower_layer::Layer;
use tower_service::Service;

use tracewire::global::{self, BoxedTracer};
use tracewire::trace::{tag, ComponentId, Span, SpanLayer, TraceContext, Tracer};

use crate::{request_host, HeaderExtractor};

const COMPONENT_HTTP_SERVER: ComponentId = ComponentId::new(5006);

/// [`Layer`] that wraps services in a [`TraceService`].
///
/// Construct one per tracer and reuse it across routes; the tracer is
/// shared, not cloned, by every service the layer produces.
#[derive(Clone, Debug)]
pub struct TraceLayer<T> {
    tracer: Option<Arc<T>>,
}

impl<T> TraceLayer<T> {
    /// Trace every request through `tracer`.
    pub fn new(tracer: T) -> Self {
        TraceLayer {
            tracer: Some(Arc::new(tracer)),
        }
    }

    /// A layer that leaves wrapped services untouched.
    ///
    /// Lets applications assemble their middleware stack unconditionally
    /// and switch tracing off by configuration.
    pub fn disabled() -> Self {
        TraceLayer { tracer: None }
    }
}

impl TraceLayer<BoxedTracer> {
    /// Build a layer from the process-wide tracer registry.
    ///
    /// When no global tracer is installed the layer is a pass-through,
    /// exactly like [`TraceLayer::disabled`].
    pub fn from_global() -> Self {
        TraceLayer {
            tracer: global::tracer().map(Arc::new),
        }
    }
}

impl<S, T> Layer<S> for TraceLayer<T> {
    type Service = TraceService<S, T>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceService {
            inner,
            tracer: self.tracer.clone(),
        }
    }
}

/// Middleware that opens an entry span for every inbound request.
///
/// See [`TraceLayer`] for construction.
#[derive(Clone, Debug)]
pub struct TraceService<S, T> {
    inner: S,
    tracer: Option<Arc<T>>,
}

impl<S, T> TraceService<S, T> {
    /// Wrap `inner`, tracing every request through `tracer`.
    pub fn new(inner: S, tracer: T) -> Self {
        TraceService {
            inner,
            tracer: Some(Arc::new(tracer)),
        }
    }
}

impl<S, T, ReqBody, ResBody> Service<Request<ReqBody>> for TraceService<S, T>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Error: fmt::Display,
    T: Tracer,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future, T::Span>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let span = match self.tracer.as_deref() {
            Some(tracer) => start_entry_span(tracer, &mut req),
            None => None,
        };
        ResponseFuture {
            inner: self.inner.call(req),
            span,
        }
    }
}

// Opens the span and stores the returned context in the request's
// extensions. Returns None when the tracer declines, leaving the request
// untraced.
fn start_entry_span<T: Tracer, B>(tracer: &T, req: &mut Request<B>) -> Option<T::Span> {
    let operation = operation_name(req);
    let parent = req
        .extensions()
        .get::<TraceContext>()
        .cloned()
        .unwrap_or_default();
    let created = tracer.create_entry_span(&parent, &operation, &HeaderExtractor(req.headers()));
    match created {
        Ok((mut span, cx)) => {
            let host = request_host(req).to_owned();
            span.set_component(COMPONENT_HTTP_SERVER);
            span.tag(tag::HTTP_METHOD, req.method().as_str());
            span.tag(tag::URL, format!("{}{}", host, req.uri().path()));
            span.tag(tag::MQ_TOPIC, host);
            span.set_layer(SpanLayer::Http);
            req.extensions_mut().insert(cx);
            Some(span)
        }
        Err(error) => {
            tracing::debug!(%error, "entry span creation failed, request left untraced");
            None
        }
    }
}

// "/{method}{path}", falling back to the route template for request
// targets that carry no path (CONNECT, OPTIONS *).
fn operation_name<B>(req: &Request<B>) -> String {
    let path = req.uri().path();
    if !path.is_empty() && path != "*" {
        return format!("/{}{}", req.method(), path);
    }
    match req.extensions().get::<RoutePattern>() {
        Some(route) => format!("/{}{}", req.method(), route.0),
        None => format!("/{}", req.method()),
    }
}

/// Route template of the matched handler, e.g. `/users/:id`.
///
/// Routing frameworks that know the matched template can insert one into
/// the request's extensions before [`TraceService`] runs; it is used for
/// span naming when the request target itself has no usable path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutePattern(pub Cow<'static, str>);

impl From<&'static str> for RoutePattern {
    fn from(route: &'static str) -> Self {
        RoutePattern(Cow::Borrowed(route))
    }
}

impl From<String> for RoutePattern {
    fn from(route: String) -> Self {
        RoutePattern(Cow::Owned(route))
    }
}

/// Failures a handler converted into a response instead of failing the
/// service call.
///
/// Insert a non-empty collection into the response's extensions and the
/// middleware marks the entry span as failed with the concatenated
/// messages, mirroring how service-level errors are recorded.
#[derive(Clone, Debug, Default)]
pub struct HandlerErrors(Vec<String>);

impl HandlerErrors {
    /// An empty collection.
    pub fn new() -> Self {
        HandlerErrors::default()
    }

    /// Record one failure.
    pub fn push(&mut self, error: impl fmt::Display) {
        self.0.push(error.to_string());
    }

    /// Whether any failure was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for HandlerErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

pin_project! {
    /// Response future for [`TraceService`].
    pub struct ResponseFuture<F, Sp> {
        #[pin]
        inner: F,
        span: Option<Sp>,
    }
}

impl<F, Sp, ResBody, E> Future for ResponseFuture<F, Sp>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
    Sp: Span,
    E: fmt::Display,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = ready!(this.inner.poll(cx));
        if let Some(mut span) = this.span.take() {
            match &result {
                Ok(response) => {
                    if let Some(errors) = response.extensions().get::<HandlerErrors>() {
                        if !errors.is_empty() {
                            span.error(SystemTime::now(), errors.to_string());
                        }
                    }
                    span.tag(tag::STATUS_CODE, response.status().as_str());
                }
                Err(error) => span.error(SystemTime::now(), error.to_string()),
            }
            span.end();
        }
        Poll::Ready(result)
    }
}
