//! Utilities for working with a process-wide tracer.
//!
//! Adapters take their tracer explicitly, which keeps them testable and
//! lets different parts of an application trace through different
//! backends. The global registry exists for applications that want one
//! shared instance wired up once at startup:
//!
//! ```
//! use std::collections::HashMap;
//! use tracewire::global;
//! use tracewire::trace::{NoopTracer, Span, TraceContext, Tracer};
//!
//! // during initialization
//! global::set_tracer(NoopTracer::new());
//!
//! // anywhere else in the process
//! let tracer = global::tracer().expect("tracer installed at startup");
//! let headers: HashMap<String, String> = HashMap::new();
//! let (mut span, _cx) = tracer
//!     .create_entry_span(&TraceContext::default(), "/GET/health", &headers)
//!     .unwrap();
//! span.end();
//! ```
//!
//! A generic tracer cannot live in a `static`, so the registry works in
//! terms of [`BoxedTracer`], which erases the concrete span type behind
//! [`ObjectSafeSpan`]. [`tracer`] returns `None` until [`set_tracer`] is
//! called; adapters treat that as "tracing disabled".

mod trace;

pub use trace::{
    set_tracer, tracer, BoxedSpan, BoxedTracer, ObjectSafeSpan, ObjectSafeTracer,
};
