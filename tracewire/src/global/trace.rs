use once_cell::sync::Lazy;
use std::fmt;
use std::mem;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use crate::propagation::{Extractor, Injector};
use crate::trace;
use crate::trace::{tag::Key, ComponentId, SpanLayer, TraceContext, TraceResult};

/// Allows a specific [`Span`] to be used generically by [`BoxedSpan`]
/// instances by mirroring the interface with object-safe methods.
///
/// [`Span`]: crate::trace::Span
pub trait ObjectSafeSpan {
    /// Record the integration that produced this span.
    fn set_component(&mut self, component: ComponentId);

    /// Classify the protocol family of the traced operation.
    fn set_layer(&mut self, layer: SpanLayer);

    /// Attach a key/value tag to the span.
    fn tag(&mut self, key: Key, value: String);

    /// Mark the span as failed at `timestamp`.
    fn error(&mut self, timestamp: SystemTime, message: String);

    /// Close the span. Implementations must ignore all subsequent calls.
    fn end(&mut self);
}

impl<T: trace::Span> ObjectSafeSpan for T {
    fn set_component(&mut self, component: ComponentId) {
        trace::Span::set_component(self, component)
    }

    fn set_layer(&mut self, layer: SpanLayer) {
        trace::Span::set_layer(self, layer)
    }

    fn tag(&mut self, key: Key, value: String) {
        trace::Span::tag(self, key, value)
    }

    fn error(&mut self, timestamp: SystemTime, message: String) {
        trace::Span::error(self, timestamp, message)
    }

    fn end(&mut self) {
        trace::Span::end(self)
    }
}

/// Wraps the [`BoxedTracer`]'s [`Span`] so it can be used generically by
/// applications without knowing the underlying type.
///
/// [`Span`]: crate::trace::Span
pub struct BoxedSpan(Box<dyn ObjectSafeSpan + Send + Sync>);

impl fmt::Debug for BoxedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoxedSpan")
    }
}

impl trace::Span for BoxedSpan {
    /// Records the integration that produced this span.
    fn set_component(&mut self, component: ComponentId) {
        self.0.set_component(component)
    }

    /// Classifies the protocol family of the traced operation.
    fn set_layer(&mut self, layer: SpanLayer) {
        self.0.set_layer(layer)
    }

    /// Attaches a key/value tag to the span.
    fn tag<V>(&mut self, key: Key, value: V)
    where
        V: Into<String>,
    {
        self.0.tag(key, value.into())
    }

    /// Marks the span as failed at `timestamp`.
    fn error(&mut self, timestamp: SystemTime, message: String) {
        self.0.error(timestamp, message)
    }

    /// Closes the span.
    fn end(&mut self) {
        self.0.end()
    }
}

/// Allows a specific [`Tracer`] to be used generically by [`BoxedTracer`]
/// instances by mirroring the interface and boxing the return types.
///
/// [`Tracer`]: crate::trace::Tracer
pub trait ObjectSafeTracer {
    /// Returns the entry span and context as trait objects so the
    /// underlying implementation can be swapped out at runtime.
    fn create_entry_span_boxed(
        &self,
        parent: &TraceContext,
        operation: &str,
        carrier: &dyn Extractor,
    ) -> TraceResult<(Box<dyn ObjectSafeSpan + Send + Sync>, TraceContext)>;

    /// Returns the exit span as a trait object so the underlying
    /// implementation can be swapped out at runtime.
    fn create_exit_span_boxed(
        &self,
        cx: &TraceContext,
        operation: &str,
        peer: &str,
        carrier: &mut dyn Injector,
    ) -> TraceResult<Box<dyn ObjectSafeSpan + Send + Sync>>;
}

impl<S, T> ObjectSafeTracer for T
where
    S: trace::Span + Send + Sync + 'static,
    T: trace::Tracer<Span = S>,
{
    fn create_entry_span_boxed(
        &self,
        parent: &TraceContext,
        operation: &str,
        carrier: &dyn Extractor,
    ) -> TraceResult<(Box<dyn ObjectSafeSpan + Send + Sync>, TraceContext)> {
        self.create_entry_span(parent, operation, carrier)
            .map(|(span, cx)| {
                let span: Box<dyn ObjectSafeSpan + Send + Sync> = Box::new(span);
                (span, cx)
            })
    }

    fn create_exit_span_boxed(
        &self,
        cx: &TraceContext,
        operation: &str,
        peer: &str,
        carrier: &mut dyn Injector,
    ) -> TraceResult<Box<dyn ObjectSafeSpan + Send + Sync>> {
        self.create_exit_span(cx, operation, peer, carrier)
            .map(|span| Box::new(span) as Box<dyn ObjectSafeSpan + Send + Sync>)
    }
}

/// Wraps the globally configured [`Tracer`] so it can be used generically
/// by applications without knowing the underlying type.
///
/// Cloning is cheap and every clone drives the same tracer, so the handle
/// can be captured by each adapter that needs one.
///
/// [`Tracer`]: crate::trace::Tracer
#[derive(Clone)]
pub struct BoxedTracer(Arc<dyn ObjectSafeTracer + Send + Sync>);

impl BoxedTracer {
    /// Create a `BoxedTracer` from a struct that implements `Tracer`.
    pub fn new<T>(tracer: T) -> Self
    where
        T: trace::Tracer + Send + Sync + 'static,
        T::Span: Send + Sync + 'static,
    {
        BoxedTracer(Arc::new(tracer))
    }
}

impl fmt::Debug for BoxedTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoxedTracer")
    }
}

impl trace::Tracer for BoxedTracer {
    /// The global tracer uses `BoxedSpan`s so that it can be a singleton,
    /// which is not possible if it takes generic type parameters.
    type Span = BoxedSpan;

    /// Starts an entry span through the underlying tracer.
    fn create_entry_span(
        &self,
        parent: &TraceContext,
        operation: &str,
        carrier: &dyn Extractor,
    ) -> TraceResult<(Self::Span, TraceContext)> {
        self.0
            .create_entry_span_boxed(parent, operation, carrier)
            .map(|(span, cx)| (BoxedSpan(span), cx))
    }

    /// Starts an exit span through the underlying tracer.
    fn create_exit_span(
        &self,
        cx: &TraceContext,
        operation: &str,
        peer: &str,
        carrier: &mut dyn Injector,
    ) -> TraceResult<Self::Span> {
        self.0
            .create_exit_span_boxed(cx, operation, peer, carrier)
            .map(BoxedSpan)
    }
}

/// The global `Tracer` singleton.
static GLOBAL_TRACER: Lazy<RwLock<Option<BoxedTracer>>> = Lazy::new(|| RwLock::new(None));

/// Returns the currently configured global [`Tracer`], or `None` when no
/// tracer has been installed.
///
/// Adapters treat an unset registry as "tracing disabled" and pass
/// requests through untouched.
///
/// [`Tracer`]: crate::trace::Tracer
pub fn tracer() -> Option<BoxedTracer> {
    GLOBAL_TRACER
        .read()
        .expect("GLOBAL_TRACER RwLock poisoned")
        .clone()
}

/// Sets the given [`Tracer`] instance as the current global tracer.
///
/// It returns the tracer that was previously mounted as global, or `None`
/// if this is the first installation.
///
/// [`Tracer`]: crate::trace::Tracer
pub fn set_tracer<T>(new_tracer: T) -> Option<BoxedTracer>
where
    T: trace::Tracer + Send + Sync + 'static,
    T::Span: Send + Sync + 'static,
{
    let mut tracer = GLOBAL_TRACER
        .write()
        .expect("GLOBAL_TRACER RwLock poisoned");
    mem::replace(&mut *tracer, Some(BoxedTracer::new(new_tracer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{NoopTracer, Span, Tracer};
    use std::collections::HashMap;

    #[test]
    fn set_tracer_replaces_and_returns_previous() {
        set_tracer(NoopTracer::new());
        let previous = set_tracer(NoopTracer::new());
        assert!(previous.is_some());

        let boxed = tracer().expect("tracer was installed");
        let carrier: HashMap<String, String> = HashMap::new();
        let (mut span, cx) = boxed
            .create_entry_span(&TraceContext::default(), "/GET/ping", &carrier)
            .unwrap();
        assert!(!cx.is_active());
        Span::end(&mut span);
    }
}
