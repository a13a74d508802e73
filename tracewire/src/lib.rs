//! Tracewire is a backend-agnostic API for tracing request/response
//! style applications: who called, what operation ran, where it went
//! next, and whether it failed.
//!
//! The API splits responsibilities in two. Instrumentation adapters
//! (HTTP middleware, client decorators, database wrappers) drive the
//! span lifecycle through the [`trace::Tracer`] and [`trace::Span`]
//! traits; tracer implementations own span identity, sampling, the
//! encoding of propagation headers, and export. Adapters therefore work
//! unchanged against any backend, including the in-memory recorder used
//! in tests.
//!
//! Two span roles mark the process boundary: an *entry* span covers an
//! inbound operation this process handles, an *exit* span covers an
//! outbound call to another process. Linkage between them travels in
//! carrier headers through the [`propagation`] traits, and the ambient
//! [`trace::TraceContext`] ties nested spans and log lines to the trace
//! that owns them.
//!
//! # Getting Started
//!
//! ```
//! use tracewire::global;
//! use tracewire::trace::{NoopTracer, Span, TraceContext, Tracer};
//! use std::collections::HashMap;
//!
//! // install a tracer once at startup; adapters can also take one
//! // explicitly instead of going through the registry
//! global::set_tracer(NoopTracer::new());
//!
//! let tracer = global::tracer().expect("tracer installed above");
//! let headers: HashMap<String, String> = HashMap::new();
//! let (mut span, cx) = tracer
//!     .create_entry_span(&TraceContext::default(), "/GET/users", &headers)
//!     .unwrap();
//! // handle the operation with `cx` as the ambient context, then close
//! assert!(!cx.is_active()); // the no-op tracer never starts a trace
//! span.end();
//! ```
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![allow(clippy::needless_doctest_main)]
#![cfg_attr(
    docsrs,
    feature(doc_cfg, doc_auto_cfg),
    deny(rustdoc::broken_intra_doc_links)
)]

pub mod global;

pub mod logs;

pub mod propagation;

#[cfg(any(feature = "testing", test))]
#[doc(hidden)]
pub mod testing;

pub mod trace;
