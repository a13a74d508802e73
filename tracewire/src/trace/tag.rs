//! Standard span tag keys.
//!
//! Tags carry per-operation detail that backends index and render, so
//! adapters agree on a small vocabulary of keys instead of inventing
//! their own. The constants in this module cover the protocol families
//! in [`SpanLayer`](crate::trace::SpanLayer); anything else can be
//! expressed with an ad-hoc [`Key`].
//!
//! # Examples
//!
//! ```
//! use tracewire::trace::{tag, Span};
//!
//! fn record_request<S: Span>(span: &mut S) {
//!     span.tag(tag::HTTP_METHOD, "GET");
//!     span.tag(tag::URL, "example.com/users");
//! }
//! ```

use std::borrow::Cow;
use std::fmt;

/// The key half of a span tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Cow<'static, str>);

impl Key {
    /// Create a new `Key`.
    pub fn new<S: Into<Key>>(value: S) -> Self {
        value.into()
    }

    /// Create a new const `Key`.
    pub const fn from_static(value: &'static str) -> Self {
        Key(Cow::Borrowed(value))
    }

    /// Returns a reference to the underlying key name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Key {
    /// Convert a `&str` to a `Key`.
    fn from(value: &'static str) -> Self {
        Key(Cow::Borrowed(value))
    }
}

impl From<String> for Key {
    /// Convert a `String` to a `Key`.
    fn from(value: String) -> Self {
        Key(Cow::Owned(value))
    }
}

impl From<Key> for String {
    /// Converts `Key` instances into `String`.
    fn from(key: Key) -> Self {
        key.0.into_owned()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute or host-relative URL of a traced request.
pub const URL: Key = Key::from_static("url");

/// HTTP response status code.
pub const STATUS_CODE: Key = Key::from_static("status_code");

/// HTTP request method.
pub const HTTP_METHOD: Key = Key::from_static("http.method");

/// Database vendor of a storage operation.
pub const DB_TYPE: Key = Key::from_static("db.type");

/// Database instance a statement ran against.
pub const DB_INSTANCE: Key = Key::from_static("db.instance");

/// Statement text of a database operation.
pub const DB_STATEMENT: Key = Key::from_static("db.statement");

/// Bind parameters of a database statement.
pub const DB_SQL_PARAMETERS: Key = Key::from_static("db.sql.parameters");

/// Queue a message was produced to or consumed from.
pub const MQ_QUEUE: Key = Key::from_static("mq.queue");

/// Topic of a produced or consumed message.
pub const MQ_TOPIC: Key = Key::from_static("mq.topic");

/// Broker address of a messaging operation.
pub const MQ_BROKER: Key = Key::from_static("mq.broker");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_from_conversions() {
        assert_eq!(Key::new("static").as_str(), "static");
        assert_eq!(Key::new(String::from("owned")).as_str(), "owned");
        assert_eq!(String::from(Key::from_static("url")), "url");
    }

    #[test]
    fn keys_compare_by_name() {
        assert_eq!(Key::new(String::from("url")), URL);
        assert_ne!(URL, STATUS_CODE);
    }
}
