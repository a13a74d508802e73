//! A tracer that keeps every span in memory for assertions.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use crate::propagation::{Extractor, Injector};
use crate::trace::{
    tag::Key, ComponentId, Span, SpanLayer, TraceContext, TraceError, TraceResult, Tracer,
};

/// Carrier key the recording tracer propagates trace IDs through.
pub const PROPAGATION_KEY: &str = "x-trace-context";

/// Service name stamped on contexts minted by [`RecordingTracer`].
pub const SERVICE_NAME: &str = "test-service";

/// Service instance stamped on contexts minted by [`RecordingTracer`].
pub const SERVICE_INSTANCE: &str = "test-instance";

/// Side of the process boundary a recorded span was created on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanKind {
    /// Inbound operation handled by this process.
    Entry,
    /// Outbound call to another process.
    Exit,
}

/// Everything a [`RecordingSpan`] observed before it was ended.
#[derive(Clone, Debug)]
pub struct SpanRecord {
    /// Operation name the span was created with.
    pub operation: String,
    /// Entry or exit.
    pub kind: SpanKind,
    /// Destination host, for exit spans.
    pub peer: Option<String>,
    /// Trace the span belongs to.
    pub trace_id: String,
    /// Component identifier, if one was set.
    pub component: Option<ComponentId>,
    /// Span layer, if one was set.
    pub layer: Option<SpanLayer>,
    /// Tags in the order they were set.
    pub tags: Vec<(Key, String)>,
    /// Error events recorded on the span.
    pub errors: Vec<(SystemTime, String)>,
}

impl SpanRecord {
    /// The last value tagged under `key`, if any.
    pub fn tag(&self, key: &Key) -> Option<&str> {
        self.tags
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
struct RecorderState {
    sequence: u64,
    started: usize,
    abandoned: usize,
    fail_spans: bool,
    finished: Vec<SpanRecord>,
}

/// A [`Tracer`] that records span activity instead of exporting it.
///
/// Spans propagate their trace ID through [`PROPAGATION_KEY`]: exit spans
/// write it to the carrier and entry spans adopt a trace ID found there,
/// so carrier plumbing is observable end to end. Cloning the tracer
/// shares its recorder, which lets a test keep a handle for assertions
/// while an adapter owns another.
#[derive(Clone, Debug, Default)]
pub struct RecordingTracer {
    state: Arc<Mutex<RecorderState>>,
}

impl RecordingTracer {
    /// Create a new recording tracer.
    pub fn new() -> Self {
        RecordingTracer::default()
    }

    /// Make every subsequent span creation fail until called with `false`.
    pub fn fail_span_creation(&self, fail: bool) {
        self.state.lock().unwrap().fail_spans = fail;
    }

    /// Number of spans handed out so far.
    pub fn started(&self) -> usize {
        self.state.lock().unwrap().started
    }

    /// Records of the spans that were ended, in end order.
    pub fn finished(&self) -> Vec<SpanRecord> {
        self.state.lock().unwrap().finished.clone()
    }

    /// Number of spans dropped without being ended.
    pub fn abandoned(&self) -> usize {
        self.state.lock().unwrap().abandoned
    }

    fn begin(&self) -> TraceResult<u64> {
        let mut state = self.state.lock().unwrap();
        if state.fail_spans {
            return Err(TraceError::from("span creation disabled for test"));
        }
        state.sequence += 1;
        state.started += 1;
        Ok(state.sequence)
    }
}

impl Tracer for RecordingTracer {
    type Span = RecordingSpan;

    fn create_entry_span(
        &self,
        parent: &TraceContext,
        operation: &str,
        carrier: &dyn Extractor,
    ) -> TraceResult<(Self::Span, TraceContext)> {
        let seq = self.begin()?;
        let trace_id = match carrier.get(PROPAGATION_KEY) {
            Some(value) if !value.is_empty() => value.to_owned(),
            _ if parent.is_active() => parent.trace_id().to_owned(),
            _ => format!("trace-{seq}"),
        };
        let cx = TraceContext::new(
            SERVICE_NAME,
            SERVICE_INSTANCE,
            trace_id.clone(),
            format!("segment-{seq}"),
            0,
        );
        let span = RecordingSpan {
            record: Some(SpanRecord {
                operation: operation.to_owned(),
                kind: SpanKind::Entry,
                peer: None,
                trace_id,
                component: None,
                layer: None,
                tags: Vec::new(),
                errors: Vec::new(),
            }),
            state: self.state.clone(),
        };
        Ok((span, cx))
    }

    fn create_exit_span(
        &self,
        cx: &TraceContext,
        operation: &str,
        peer: &str,
        carrier: &mut dyn Injector,
    ) -> TraceResult<Self::Span> {
        let seq = self.begin()?;
        let trace_id = if cx.is_active() {
            cx.trace_id().to_owned()
        } else {
            format!("trace-{seq}")
        };
        carrier.set(PROPAGATION_KEY, trace_id.clone());
        Ok(RecordingSpan {
            record: Some(SpanRecord {
                operation: operation.to_owned(),
                kind: SpanKind::Exit,
                peer: Some(peer.to_owned()),
                trace_id,
                component: None,
                layer: None,
                tags: Vec::new(),
                errors: Vec::new(),
            }),
            state: self.state.clone(),
        })
    }
}

/// Span produced by [`RecordingTracer`].
///
/// The record moves to the recorder on the first [`end`](Span::end) call;
/// a span dropped before that counts as abandoned.
#[derive(Debug)]
pub struct RecordingSpan {
    record: Option<SpanRecord>,
    state: Arc<Mutex<RecorderState>>,
}

impl Span for RecordingSpan {
    fn set_component(&mut self, component: ComponentId) {
        if let Some(record) = self.record.as_mut() {
            record.component = Some(component);
        }
    }

    fn set_layer(&mut self, layer: SpanLayer) {
        if let Some(record) = self.record.as_mut() {
            record.layer = Some(layer);
        }
    }

    fn tag<V>(&mut self, key: Key, value: V)
    where
        V: Into<String>,
    {
        if let Some(record) = self.record.as_mut() {
            record.tags.push((key, value.into()));
        }
    }

    fn error(&mut self, timestamp: SystemTime, message: String) {
        if let Some(record) = self.record.as_mut() {
            record.errors.push((timestamp, message));
        }
    }

    fn end(&mut self) {
        if let Some(record) = self.record.take() {
            self.state.lock().unwrap().finished.push(record);
        }
    }
}

impl Drop for RecordingSpan {
    fn drop(&mut self) {
        if self.record.take().is_some() {
            self.state.lock().unwrap().abandoned += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn entry_span_adopts_carrier_trace_id() {
        let tracer = RecordingTracer::new();
        let mut carrier = HashMap::new();
        carrier.set(PROPAGATION_KEY, "trace-upstream".to_string());

        let (mut span, cx) = tracer
            .create_entry_span(&TraceContext::default(), "/GET/users", &carrier)
            .unwrap();
        span.end();

        assert_eq!(cx.trace_id(), "trace-upstream");
        assert_eq!(tracer.finished()[0].trace_id, "trace-upstream");
    }

    #[test]
    fn exit_span_writes_carrier_and_continues_trace() {
        let tracer = RecordingTracer::new();
        let inbound: HashMap<String, String> = HashMap::new();
        let (mut entry, cx) = tracer
            .create_entry_span(&TraceContext::default(), "/GET/users", &inbound)
            .unwrap();

        let mut carrier = HashMap::new();
        let mut exit = tracer
            .create_exit_span(&cx, "/GET/avatars", "cdn.example.com", &mut carrier)
            .unwrap();
        exit.end();
        entry.end();

        assert_eq!(carrier.get(PROPAGATION_KEY).map(String::as_str), Some(cx.trace_id()));
        let finished = tracer.finished();
        assert_eq!(finished.len(), 2);
        assert_eq!(finished[0].trace_id, finished[1].trace_id);
        assert_eq!(finished[0].peer.as_deref(), Some("cdn.example.com"));
    }

    #[test]
    fn end_is_idempotent_and_drop_counts_abandoned() {
        let tracer = RecordingTracer::new();
        let carrier: HashMap<String, String> = HashMap::new();
        let (mut span, _cx) = tracer
            .create_entry_span(&TraceContext::default(), "/GET/a", &carrier)
            .unwrap();
        span.end();
        span.end();
        drop(span);
        assert_eq!(tracer.finished().len(), 1);
        assert_eq!(tracer.abandoned(), 0);

        let (span, _cx) = tracer
            .create_entry_span(&TraceContext::default(), "/GET/b", &carrier)
            .unwrap();
        drop(span);
        assert_eq!(tracer.abandoned(), 1);
        assert_eq!(tracer.started(), 2);
    }

    #[test]
    fn fail_span_creation_reports_errors() {
        let tracer = RecordingTracer::new();
        let carrier: HashMap<String, String> = HashMap::new();
        tracer.fail_span_creation(true);
        let result = tracer.create_entry_span(&TraceContext::default(), "/GET/users", &carrier);
        assert!(result.is_err());
        assert_eq!(tracer.started(), 0);

        tracer.fail_span_creation(false);
        assert!(tracer
            .create_entry_span(&TraceContext::default(), "/GET/users", &carrier)
            .is_ok());
    }
}
