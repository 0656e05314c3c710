//! SSE Core Types
//!
//! This crate provides the event model for Server-Sent Events streams: the
//! wire-agnostic [`Event`], the [`Eventable`] conversion that domain objects
//! implement, and the [`HELLO`] / [`GOODBYE`] sentinel events.
//!
//! It has no I/O. Framing and delivery live in `sse-server`.
//!
//! # Usage
//!
//! ```rust
//! use sse_core::{Event, JsonValue};
//!
//! let event: Event<JsonValue> = Event::new(serde_json::json!({"x": 1}))
//!     .with_id("42")
//!     .with_retry(500);
//! assert!(!event.is_error());
//! ```

pub mod error;
pub mod event;

pub use error::{CoreError, EventError, Result};

/// Re-export serde_json::Value for consistent JSON handling across crates
pub use serde_json::Value as JsonValue;

pub use event::{Body, Event, Eventable, ERROR_EVENT_TYPE, GOODBYE, HELLO};
