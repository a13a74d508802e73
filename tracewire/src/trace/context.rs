/// The ambient, request-scoped identity of an active trace.
///
/// Tracers hand one out when an entry span is created; the adapter that
/// opened the span stores it where nested work can reach it (HTTP
/// adapters use the request's extensions). Outbound adapters read it to
/// parent their exit spans and log layers snapshot it through
/// [`TraceIdentity`](crate::logs::TraceIdentity).
///
/// The default value is the "no active span" sentinel: empty identifiers
/// and span ID `0`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceContext {
    service_name: String,
    service_instance: String,
    trace_id: String,
    trace_segment_id: String,
    span_id: i32,
}

impl TraceContext {
    /// Assemble a context from its identifiers.
    ///
    /// Intended for [`Tracer`](crate::trace::Tracer) implementations;
    /// adapters only ever read contexts.
    pub fn new(
        service_name: impl Into<String>,
        service_instance: impl Into<String>,
        trace_id: impl Into<String>,
        trace_segment_id: impl Into<String>,
        span_id: i32,
    ) -> Self {
        TraceContext {
            service_name: service_name.into(),
            service_instance: service_instance.into(),
            trace_id: trace_id.into(),
            trace_segment_id: trace_segment_id.into(),
            span_id,
        }
    }

    /// Name of the service this process runs as.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Instance of the service, typically a host or pod name.
    pub fn service_instance(&self) -> &str {
        &self.service_instance
    }

    /// Identifier of the distributed trace this context belongs to.
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Identifier of the trace segment recorded by this process.
    pub fn trace_segment_id(&self) -> &str {
        &self.trace_segment_id
    }

    /// Identifier of the active span within the segment.
    pub fn span_id(&self) -> i32 {
        self.span_id
    }

    /// Whether the context carries an active span.
    pub fn is_active(&self) -> bool {
        !self.trace_id.is_empty()
    }
}
