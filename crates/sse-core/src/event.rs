//! SSE Event Model
//!
//! This module defines the wire-agnostic representation of one Server-Sent
//! Events message:
//! - [`Event`] - one message: a [`Body`] plus optional `id`, `event` and `retry` fields
//! - [`Body`] - either a serializable payload or an error
//! - [`Eventable`] - conversion from domain objects into an [`Event`]
//! - [`HELLO`] / [`GOODBYE`] - the sentinel events that open and close a stream

use std::borrow::Cow;

use serde::Serialize;

use crate::error::{EventError, Result};
use crate::JsonValue;

/// Event type used for error frames.
pub const ERROR_EVENT_TYPE: &str = "err";

/// Sent once right after a stream is negotiated.
///
/// Tells the client it may retry a dropped connection after one second.
pub static HELLO: Event<&'static str> = Event {
    body: Body::Data("hello"),
    id: Cow::Borrowed(""),
    event_type: Cow::Borrowed("open"),
    retry: 1000,
};

/// Sent once when the event source is exhausted without cancellation.
///
/// The short retry makes the client reconnect almost immediately, so a
/// paginated producer looks like a single endless stream.
pub static GOODBYE: Event<&'static str> = Event {
    body: Body::Data("byebye"),
    id: Cow::Borrowed(""),
    event_type: Cow::Borrowed("close"),
    retry: 10,
};

/// What an event carries: a payload or a fault, never both.
#[derive(Debug, Clone)]
pub enum Body<D = JsonValue> {
    /// Payload, JSON-encoded on the `data:` line.
    Data(D),
    /// Fault, rendered as an `err` event with its plain-text message.
    Error(EventError),
}

/// One SSE message.
///
/// `id`, `event_type` and `retry` are only rendered when the body is
/// [`Body::Data`]. Empty strings and a zero retry mean "omit the field".
#[derive(Debug, Clone)]
pub struct Event<D = JsonValue> {
    /// Payload or error.
    pub body: Body<D>,
    /// SSE `id` field.
    pub id: Cow<'static, str>,
    /// SSE `event` field.
    pub event_type: Cow<'static, str>,
    /// SSE `retry` field, in milliseconds.
    pub retry: u64,
}

impl<D> Event<D> {
    /// Creates a data event with no optional fields set.
    pub fn new(data: D) -> Self {
        Self {
            body: Body::Data(data),
            id: Cow::Borrowed(""),
            event_type: Cow::Borrowed(""),
            retry: 0,
        }
    }

    /// Creates an error event.
    pub fn error(err: impl Into<EventError>) -> Self {
        Self {
            body: Body::Error(err.into()),
            id: Cow::Borrowed(""),
            event_type: Cow::Borrowed(""),
            retry: 0,
        }
    }

    /// Sets the event ID.
    pub fn with_id(mut self, id: impl Into<Cow<'static, str>>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the event type.
    pub fn with_event_type(mut self, event_type: impl Into<Cow<'static, str>>) -> Self {
        self.event_type = event_type.into();
        self
    }

    /// Sets the reconnect hint in milliseconds.
    pub fn with_retry(mut self, retry: u64) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the payload, if this is a data event.
    pub fn data(&self) -> Option<&D> {
        match &self.body {
            Body::Data(data) => Some(data),
            Body::Error(_) => None,
        }
    }

    /// Returns the error, if this is an error event.
    pub fn error_ref(&self) -> Option<&EventError> {
        match &self.body {
            Body::Data(_) => None,
            Body::Error(err) => Some(err),
        }
    }

    /// Returns true if this event carries an error.
    pub fn is_error(&self) -> bool {
        matches!(self.body, Body::Error(_))
    }
}

impl<D: Serialize> Event<D> {
    /// Encodes the payload as JSON.
    ///
    /// Returns `Ok(None)` for error events, which have no payload to encode.
    pub fn encode_data(&self) -> Result<Option<String>> {
        match &self.body {
            Body::Data(data) => Ok(Some(serde_json::to_string(data)?)),
            Body::Error(_) => Ok(None),
        }
    }
}

/// Anything that can be turned into an [`Event`].
///
/// This is the only coupling between an event producer and the stream:
/// the stream never looks at domain objects, only at the events they
/// convert into.
///
/// # Example
///
/// ```rust
/// use sse_core::{Event, Eventable};
///
/// struct Trade {
///     id: u64,
///     price: f64,
/// }
///
/// impl Eventable for Trade {
///     type Data = f64;
///
///     fn sse_event(self) -> Event<f64> {
///         Event::new(self.price)
///             .with_id(self.id.to_string())
///             .with_event_type("trade")
///     }
/// }
///
/// let event = Trade { id: 7, price: 1.5 }.sse_event();
/// assert_eq!(event.id, "7");
/// ```
pub trait Eventable {
    /// Payload type of the produced event.
    type Data: Serialize;

    /// Returns the SSE form of this value.
    fn sse_event(self) -> Event<Self::Data>;
}

impl<D: Serialize> Eventable for Event<D> {
    type Data = D;

    fn sse_event(self) -> Event<D> {
        self
    }
}

/// A fallible producer item: `Ok` converts normally, `Err` becomes an error event.
impl<T, E> Eventable for std::result::Result<T, E>
where
    T: Eventable,
    E: std::error::Error + Send + Sync + 'static,
{
    type Data = T::Data;

    fn sse_event(self) -> Event<T::Data> {
        match self {
            Ok(value) => value.sse_event(),
            Err(err) => Event::error(EventError::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("upstream went away")]
    struct UpstreamGone;

    #[test]
    fn test_sentinels() {
        assert_eq!(HELLO.data(), Some(&"hello"));
        assert_eq!(HELLO.event_type, "open");
        assert_eq!(HELLO.retry, 1000);
        assert!(HELLO.id.is_empty());

        assert_eq!(GOODBYE.data(), Some(&"byebye"));
        assert_eq!(GOODBYE.event_type, "close");
        assert_eq!(GOODBYE.retry, 10);
    }

    #[test]
    fn test_builder_sets_optional_fields() {
        let event = Event::new(json!({"x": 1}))
            .with_id("42")
            .with_event_type(String::from("trade"))
            .with_retry(500);

        assert_eq!(event.id, "42");
        assert_eq!(event.event_type, "trade");
        assert_eq!(event.retry, 500);
        assert_eq!(event.data(), Some(&json!({"x": 1})));
        assert!(!event.is_error());
    }

    #[test]
    fn test_event_is_its_own_eventable() {
        let event = Event::new(3u8).with_id("a");
        let converted = event.clone().sse_event();
        assert_eq!(converted.id, event.id);
        assert_eq!(converted.data(), Some(&3));
    }

    #[test]
    fn test_result_eventable() {
        let ok: std::result::Result<Event<u8>, UpstreamGone> = Ok(Event::new(1));
        assert_eq!(ok.sse_event().data(), Some(&1));

        let err: std::result::Result<Event<u8>, UpstreamGone> = Err(UpstreamGone);
        let event = err.sse_event();
        assert!(event.is_error());
        assert_eq!(event.error_ref().map(ToString::to_string).as_deref(), Some("upstream went away"));
    }

    #[test]
    fn test_encode_data() {
        let event = Event::new(json!({"x": 1}));
        assert_eq!(event.encode_data().unwrap().as_deref(), Some(r#"{"x":1}"#));

        let event: Event = Event::error("boom");
        assert!(event.encode_data().unwrap().is_none());
    }
}
