//! SSE Server
//!
//! This crate turns a producer of events into a Server-Sent Events response
//! that browser `EventSource` clients can consume.
//!
//! # Overview
//!
//! - **Frame Writer**: renders one event in the SSE wire grammar and flushes it ([`frame`])
//! - **Preamble**: checks the transport can stream, commits headers, sends `hello` ([`preamble`])
//! - **Stream Driver**: forwards events until the source ends or the connection is cancelled ([`streamer`])
//! - **Transport Layer**: the [`ResponseWriter`] abstraction plus axum and in-memory implementations
//!
//! # Usage
//!
//! ```rust,ignore
//! use sse_server::{streamer, sse_response};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn events() -> axum::response::Response {
//!     let (sender, streamer) = streamer::channel(32, CancellationToken::new());
//!     tokio::spawn(async move {
//!         sender.send(sse_core::Event::new("tick")).await.ok();
//!     });
//!     sse_response(streamer, 32).await
//! }
//! ```

pub mod error;
pub mod frame;
pub mod preamble;
pub mod streamer;
pub mod transport;

// Re-export sse-core types for convenience
pub use sse_core::*;

pub use error::{Result, StreamError};
pub use frame::{format_event, write_event};
pub use preamble::{write_preamble, STREAMING_NOT_SUPPORTED};
pub use streamer::{channel, EventSender, SendError, StreamOutcome, Streamer};
pub use transport::{sse_response, BodyWriter, RecordingWriter, ResponseWriter};
