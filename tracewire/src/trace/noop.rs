//! No-op trace impls
//!
//! Used where tracing is configured off, and as a stand-in tracer in
//! examples and tests that do not assert on span activity.

use std::time::SystemTime;

use crate::propagation::{Extractor, Injector};
use crate::trace::{
    tag::Key, ComponentId, Span, SpanLayer, TraceContext, TraceResult, Tracer,
};

/// A no-op instance of a `Tracer`.
///
/// Every span it creates is a [`NoopSpan`] and every entry context it
/// returns is the inactive default, so adapters nested under it stay
/// no-ops as well.
#[derive(Clone, Debug, Default)]
pub struct NoopTracer {
    _private: (),
}

impl NoopTracer {
    /// Create a new no-op tracer.
    pub fn new() -> Self {
        NoopTracer::default()
    }
}

impl Tracer for NoopTracer {
    type Span = NoopSpan;

    /// Starts a `NoopSpan` and returns the inactive context.
    fn create_entry_span(
        &self,
        _parent: &TraceContext,
        _operation: &str,
        _carrier: &dyn Extractor,
    ) -> TraceResult<(Self::Span, TraceContext)> {
        Ok((NoopSpan::new(), TraceContext::default()))
    }

    /// Starts a `NoopSpan` and writes nothing to the carrier.
    fn create_exit_span(
        &self,
        _cx: &TraceContext,
        _operation: &str,
        _peer: &str,
        _carrier: &mut dyn Injector,
    ) -> TraceResult<Self::Span> {
        Ok(NoopSpan::new())
    }
}

/// A no-op instance of a `Span`.
#[derive(Clone, Debug, Default)]
pub struct NoopSpan {
    _private: (),
}

impl NoopSpan {
    /// Create a new no-op span.
    pub fn new() -> Self {
        NoopSpan::default()
    }
}

impl Span for NoopSpan {
    /// Ignores the component.
    fn set_component(&mut self, _component: ComponentId) {
        // Ignored
    }

    /// Ignores the layer.
    fn set_layer(&mut self, _layer: SpanLayer) {
        // Ignored
    }

    /// Ignores the tag.
    fn tag<V>(&mut self, _key: Key, _value: V)
    where
        V: Into<String>,
    {
        // Ignored
    }

    /// Ignores the error.
    fn error(&mut self, _timestamp: SystemTime, _message: String) {
        // Ignored
    }

    /// Ignores the close.
    fn end(&mut self) {
        // Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::tag;
    use std::collections::HashMap;

    #[test]
    fn noop_entry_span_returns_inactive_context() {
        let tracer = NoopTracer::new();
        let carrier: HashMap<String, String> = HashMap::new();
        let (mut span, cx) = tracer
            .create_entry_span(&TraceContext::default(), "/GET/users", &carrier)
            .unwrap();
        assert!(!cx.is_active());
        span.tag(tag::HTTP_METHOD, "GET");
        span.end();
        span.end();
    }

    #[test]
    fn noop_exit_span_leaves_carrier_untouched() {
        let tracer = NoopTracer::new();
        let mut carrier: HashMap<String, String> = HashMap::new();
        let mut span = tracer
            .create_exit_span(&TraceContext::default(), "/GET/users", "example.com", &mut carrier)
            .unwrap();
        span.error(SystemTime::now(), "ignored".to_string());
        span.end();
        assert!(carrier.is_empty());
    }
}
