//! Carrier interfaces for cross-process context propagation.
//!
//! Trace linkage travels between processes as string key/value pairs on
//! the transport's native metadata, most commonly HTTP headers. The two
//! traits here are the two directions of that mapping: an outbound
//! adapter hands its [`Tracer`] an [`Injector`] over the outgoing
//! request's headers, an inbound adapter hands it an [`Extractor`] over
//! the incoming ones. The tracer implementation owns which keys exist
//! and how linkage is encoded in them; neither side of the carrier
//! interprets the values.
//!
//! [`Tracer`]: crate::trace::Tracer

use std::collections::HashMap;

/// Injector provides an interface for adding fields to an outbound carrier.
pub trait Injector {
    /// Add a key and value to the underlying data.
    fn set(&mut self, key: &str, value: String);
}

/// Extractor provides an interface for reading fields from an inbound carrier.
pub trait Extractor {
    /// Get a value from a key from the underlying data.
    ///
    /// A missing key yields `None`, never an error: requests that carry
    /// no trace linkage are the common case.
    fn get(&self, key: &str) -> Option<&str>;

    /// Collect all the keys from the underlying data.
    fn keys(&self) -> Vec<&str>;
}

impl<S: std::hash::BuildHasher> Injector for HashMap<String, String, S> {
    /// Set a key and value in the HashMap.
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_lowercase(), value);
    }
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    /// Get a value for a key from the HashMap.
    fn get(&self, key: &str) -> Option<&str> {
        self.get(&key.to_lowercase()).map(|v| v.as_str())
    }

    /// Collect all the keys from the HashMap.
    fn keys(&self) -> Vec<&str> {
        self.keys().map(|k| k.as_str()).collect::<Vec<_>>()
    }
}
