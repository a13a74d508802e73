//! API for tracing applications and libraries.
//!
//! The `trace` module includes types for tracking the progression of a
//! single request while it is handled by services that make up an
//! application. A trace is a tree of [`Span`]s, with two span roles at
//! the process boundary: an *entry* span covers an inbound operation
//! this process handles, an *exit* span covers an outbound call to
//! another process. Linkage between the two sides travels in carrier
//! headers through the [`propagation`](crate::propagation) traits.
//!
//! [`Tracer`] is the seam between instrumentation adapters and tracing
//! backends: adapters call [`create_entry_span`] and [`create_exit_span`]
//! and drive the returned span's lifecycle, while the implementation
//! decides identity, sampling, and export.
//!
//! [`create_entry_span`]: Tracer::create_entry_span
//! [`create_exit_span`]: Tracer::create_exit_span

use thiserror::Error;

mod context;
mod noop;
mod span;
pub mod tag;
mod tracer;

pub use self::{
    context::TraceContext,
    noop::{NoopSpan, NoopTracer},
    span::{ComponentId, Span, SpanLayer},
    tag::Key,
    tracer::Tracer,
};

/// Describe the result of operations in tracing API.
pub type TraceResult<T> = Result<T, TraceError>;

/// Errors returned by the trace API.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceError {
    /// The propagation carrier held linkage state that could not be decoded.
    #[error("invalid propagation state: {0}")]
    InvalidPropagation(String),

    /// Other errors propagated from tracer implementations.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl From<String> for TraceError {
    fn from(err_msg: String) -> Self {
        TraceError::Other(Box::new(Custom(err_msg)))
    }
}

impl From<&'static str> for TraceError {
    fn from(err_msg: &'static str) -> Self {
        TraceError::Other(Box::new(Custom(err_msg.into())))
    }
}

/// Wrap type for string
#[derive(Error, Debug)]
#[error("{0}")]
struct Custom(String);
