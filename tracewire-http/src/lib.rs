//! HTTP instrumentation adapters for [`tracewire`].
//!
//! Two adapters cover the two directions of HTTP traffic:
//!
//! - [`server::TraceLayer`] wraps a [`tower_service::Service`] and opens
//!   an entry span for every inbound request, adopting trace linkage
//!   from the incoming propagation headers.
//! - [`client::TracedClient`] wraps an [`HttpClient`] and opens an exit
//!   span for every outbound call, injecting propagation headers before
//!   the request leaves the process.
//!
//! The server adapter stores the [`TraceContext`] it receives in the
//! request's extensions; the client adapter reads it from the outgoing
//! request's extensions to parent its exit span, so handlers only need
//! to copy the context from the inbound request to the outbound one to
//! keep a trace connected across hops.
//!
//! Both adapters degrade to transparent pass-throughs when no tracer is
//! available or a span cannot be created, and they never alter bodies,
//! status codes, or errors: an instrumented stack must behave exactly
//! like the bare one.
//!
//! ```
//! use tracewire::trace::NoopTracer;
//! use tracewire_http::client::TracedClient;
//! use tracewire_http::server::TraceLayer;
//!
//! let layer = TraceLayer::new(NoopTracer::new());
//! let client = TracedClient::builder()
//!     .with_tracer(NoopTracer::new())
//!     .with_tag("env", "staging")
//!     .build()?;
//! # Ok::<(), tracewire_http::Error>(())
//! ```
//!
//! [`TraceContext`]: tracewire::trace::TraceContext

use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

#[doc(no_inline)]
pub use bytes::Bytes;
#[doc(no_inline)]
pub use http::{Request, Response};
use tracewire::logs::TraceIdentity;
use tracewire::propagation::{Extractor, Injector};
use tracewire::trace::TraceContext;

pub mod client;
pub mod server;

pub use client::{TracedClient, TracedClientBuilder};
pub use server::TraceLayer;

/// Errors raised while assembling adapters.
#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A client builder was finalized without a tracer.
    #[error("invalid tracer")]
    InvalidTracer,

    /// No transport was supplied and no default one is compiled in.
    #[error("no transport configured")]
    MissingTransport,
}

/// Helper for injecting propagation headers into HTTP requests. Handed to
/// the tracer when an exit span is created so linkage travels with the
/// outgoing request.
pub struct HeaderInjector<'a>(pub &'a mut http::HeaderMap);

impl Injector for HeaderInjector<'_> {
    /// Set a key and value in the HeaderMap. Does nothing if the key or value are not valid inputs.
    fn set(&mut self, key: &str, value: String) {
        if let Ok(name) = http::header::HeaderName::from_bytes(key.as_bytes()) {
            if let Ok(val) = http::header::HeaderValue::from_str(&value) {
                self.0.insert(name, val);
            }
        }
    }
}

/// Helper for extracting propagation headers from HTTP requests. Handed
/// to the tracer when an entry span is created so upstream linkage can be
/// decoded.
pub struct HeaderExtractor<'a>(pub &'a http::HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    /// Get a value for a key from the HeaderMap. If the value is not valid ASCII, returns None.
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    /// Collect all the keys from the HeaderMap.
    fn keys(&self) -> Vec<&str> {
        self.0
            .keys()
            .map(|value| value.as_str())
            .collect::<Vec<_>>()
    }
}

pub type HttpError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A minimal interface necessary for sending requests over HTTP.
///
/// Users sometimes choose HTTP clients that rely on a certain async
/// runtime. This trait allows users to bring their choice of HTTP client,
/// and it is the seam [`client::TracedClient`] decorates: the wrapper
/// implements it too, so a traced client drops in anywhere a transport is
/// expected.
#[async_trait]
pub trait HttpClient: Debug + Send + Sync {
    /// Send the specified HTTP request with `Bytes` payload.
    ///
    /// Returns the HTTP response including the status code and body.
    ///
    /// Returns an error only if the request could not be completed, e.g.
    /// because of a timeout, infinite redirects, or a loss of connection.
    /// Responses with failure status codes are returned, not converted
    /// into errors.
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError>;
}

#[cfg(feature = "reqwest")]
mod reqwest {
    use super::{async_trait, Bytes, HttpClient, HttpError, Request, Response};

    #[async_trait]
    impl HttpClient for reqwest::Client {
        async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            let request = request.try_into()?;
            let mut response = self.execute(request).await?;
            let headers = std::mem::take(response.headers_mut());
            let mut http_response = Response::builder()
                .status(response.status())
                .body(response.bytes().await?)?;
            *http_response.headers_mut() = headers;

            Ok(http_response)
        }
    }
}

/// Snapshot the trace identifiers attached to `req` for log correlation.
///
/// Requests that did not pass through an enabled [`server::TraceLayer`]
/// produce the empty identity, which renders as `[,,,,0]`.
pub fn trace_identity<B>(req: &Request<B>) -> TraceIdentity {
    req.extensions()
        .get::<TraceContext>()
        .map(TraceIdentity::from_context)
        .unwrap_or_default()
}

// Host the request is addressed to: the authority of absolute-form
// targets, otherwise the Host header.
pub(crate) fn request_host<B>(req: &Request<B>) -> &str {
    req.uri()
        .authority()
        .map(|authority| authority.as_str())
        .or_else(|| {
            req.headers()
                .get(http::header::HOST)
                .and_then(|host| host.to_str().ok())
        })
        .unwrap_or_default()
}
