//! Log correlation support.
//!
//! Trace identifiers rarely travel inside log events themselves; services
//! embed them in the rendered log line so an operator can jump from a log
//! to the owning trace. [`TraceIdentity`] is the snapshot applications
//! format for that purpose.

use std::fmt;

use crate::trace::TraceContext;

/// A point-in-time copy of the identifiers carried by a [`TraceContext`].
///
/// The snapshot is display-only: derive one per log call site, render it,
/// and drop it. Contexts without an active span produce empty identifiers
/// and span ID `0`, so the rendering stays machine-parseable either way.
///
/// # Examples
///
/// ```
/// use tracewire::logs::TraceIdentity;
/// use tracewire::trace::TraceContext;
///
/// let identity = TraceIdentity::from_context(&TraceContext::default());
/// assert_eq!(identity.to_string(), "[,,,,0]");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceIdentity {
    /// Name of the service that recorded the segment.
    pub service_name: String,
    /// Instance of the service.
    pub service_instance: String,
    /// Identifier of the distributed trace.
    pub trace_id: String,
    /// Identifier of the segment recorded by this process.
    pub trace_segment_id: String,
    /// Identifier of the active span within the segment.
    pub span_id: i32,
}

impl TraceIdentity {
    /// Snapshot the identifiers carried by `cx`.
    pub fn from_context(cx: &TraceContext) -> Self {
        TraceIdentity {
            service_name: cx.service_name().to_owned(),
            service_instance: cx.service_instance().to_owned(),
            trace_id: cx.trace_id().to_owned(),
            trace_segment_id: cx.trace_segment_id().to_owned(),
            span_id: cx.span_id(),
        }
    }
}

impl fmt::Display for TraceIdentity {
    /// Renders `[service,instance,traceID,segmentID,spanID]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{},{},{},{}]",
            self.service_name,
            self.service_instance,
            self.trace_id,
            self.trace_segment_id,
            self.span_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_all_fields_in_order() {
        let cx = TraceContext::new("checkout", "pod-7", "trace-1", "segment-9", 3);
        let identity = TraceIdentity::from_context(&cx);
        assert_eq!(identity.to_string(), "[checkout,pod-7,trace-1,segment-9,3]");
    }

    #[test]
    fn inactive_context_renders_placeholders() {
        let identity = TraceIdentity::from_context(&TraceContext::default());
        assert_eq!(identity.to_string(), "[,,,,0]");
    }

    #[test]
    fn snapshot_copies_every_field() {
        let cx = TraceContext::new("billing", "vm-2", "trace-4", "segment-1", 0);
        let identity = TraceIdentity::from_context(&cx);
        assert_eq!(identity.service_name, "billing");
        assert_eq!(identity.service_instance, "vm-2");
        assert_eq!(identity.trace_id, "trace-4");
        assert_eq!(identity.trace_segment_id, "segment-1");
        assert_eq!(identity.span_id, 0);
    }
}
