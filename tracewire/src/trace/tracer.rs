use crate::propagation::{Extractor, Injector};
use crate::trace::{Span, TraceContext, TraceResult};

/// Interface for starting entry and exit spans.
///
/// Implementations own span identity, parent/child linkage, the encoding
/// of propagation headers, sampling, and export. Adapters only drive the
/// span lifecycle, which keeps them portable across tracer backends.
///
/// Adapters receive their tracer explicitly, usually behind an `Arc`, so
/// they can be exercised against a recording implementation in tests.
/// The [`global`](crate::global) registry exists for applications that
/// prefer a single process-wide instance.
pub trait Tracer {
    /// The span type produced by this tracer.
    type Span: Span;

    /// Start a span for an inbound operation handled by this process.
    ///
    /// `carrier` exposes the propagation headers of the incoming request.
    /// The implementation decodes upstream linkage from it, where a
    /// missing key means a new trace rather than an error, and may
    /// consult `parent` when the caller lives in the same process.
    ///
    /// Returns the span together with the [`TraceContext`] that nested
    /// operations should run under.
    fn create_entry_span(
        &self,
        parent: &TraceContext,
        operation: &str,
        carrier: &dyn Extractor,
    ) -> TraceResult<(Self::Span, TraceContext)>;

    /// Start a span for an outbound call to `peer`.
    ///
    /// The implementation serializes the span context derived from `cx`
    /// through `carrier` so the callee can join the trace. Every pair
    /// written to the carrier is attached before this method returns,
    /// which lets callers hand the request to the transport immediately
    /// afterwards.
    fn create_exit_span(
        &self,
        cx: &TraceContext,
        operation: &str,
        peer: &str,
        carrier: &mut dyn Injector,
    ) -> TraceResult<Self::Span>;
}
