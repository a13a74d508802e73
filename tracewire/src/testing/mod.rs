//! In-memory implementations for testing instrumentation adapters.

pub mod trace;
