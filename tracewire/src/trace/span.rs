use std::time::SystemTime;

use crate::trace::tag::Key;

/// Numeric identifier of the integration that produced a span.
///
/// Backends use the component to group spans by the library that emitted
/// them, so every adapter claims a fixed value from the component
/// registry rather than deriving one at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentId(i32);

impl ComponentId {
    /// Create a component identifier from its registry value.
    pub const fn new(id: i32) -> Self {
        ComponentId(id)
    }

    /// Returns the raw registry value.
    pub const fn value(self) -> i32 {
        self.0
    }
}

/// The protocol family of a traced operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpanLayer {
    /// No classification.
    Unknown = 0,
    /// Database access.
    Database = 1,
    /// Remote procedure calls.
    Rpc = 2,
    /// HTTP traffic.
    Http = 3,
    /// Message queue produce or consume.
    Mq = 4,
    /// Cache access.
    Cache = 5,
}

/// Interface for a single traced operation.
///
/// A span is created by a [`Tracer`], mutated by the adapter that owns it
/// while the operation runs, and closed exactly once when the operation
/// finishes. [`end`](Span::end) is the close point: the first call wins,
/// later calls are ignored, and implementations close an un-ended span on
/// drop so the number of closed spans never exceeds the number created.
///
/// [`Tracer`]: crate::trace::Tracer
pub trait Span {
    /// Record the integration that produced this span.
    fn set_component(&mut self, component: ComponentId);

    /// Classify the protocol family of the traced operation.
    fn set_layer(&mut self, layer: SpanLayer);

    /// Attach a key/value tag to the span.
    ///
    /// Standard keys live in [`tag`](crate::trace::tag). Setting the same
    /// key twice overwrites: the last value wins.
    fn tag<V>(&mut self, key: Key, value: V)
    where
        V: Into<String>;

    /// Mark the span as failed at `timestamp` with a human-readable
    /// message.
    ///
    /// Recording an error does not close the span; multiple errors may be
    /// recorded before [`end`](Span::end).
    fn error(&mut self, timestamp: SystemTime, message: String);

    /// Close the span.
    fn end(&mut self);
}
