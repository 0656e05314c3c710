//! Transport Layer for SSE Streams
//!
//! The stream driver never talks to a socket directly. It writes through a
//! [`ResponseWriter`], the host's view of one HTTP response:
//!
//! - **Body transport**: an axum response fed by a spawned driver via [`body`]
//! - **Recording transport**: an in-memory response for tests and tooling via [`recorder`]
//!
//! # Example
//!
//! ```rust,ignore
//! use sse_server::{streamer, transport::sse_response};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn events_endpoint() -> axum::response::Response {
//!     let (sender, streamer) = streamer::channel::<sse_core::Event>(32, CancellationToken::new());
//!
//!     tokio::spawn(async move {
//!         sender.send(sse_core::Event::new(serde_json::json!({"x": 1}))).await.ok();
//!     });
//!
//!     sse_response(streamer, 32).await
//! }
//! ```

pub mod body;
pub mod recorder;

use std::io;

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};

pub use body::{sse_response, BodyWriter};
pub use recorder::RecordingWriter;

/// The host's response for one connection.
///
/// Headers are mutable until [`write_status`](ResponseWriter::write_status)
/// commits them. Writing body bytes before committing commits an implicit
/// `200 OK`.
#[async_trait]
pub trait ResponseWriter: Send {
    /// Response headers, mutable until the status is written.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commits the status line and headers. Later calls are ignored.
    fn write_status(&mut self, status: StatusCode);

    /// Appends bytes to the response body.
    async fn write(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Whether this transport can push buffered bytes to the client on demand.
    fn can_flush(&self) -> bool;

    /// Pushes buffered bytes to the client.
    async fn flush(&mut self) -> io::Result<()>;
}

/// Error returned by [`ResponseWriter::flush`] on transports without flush support.
pub(crate) fn flush_unsupported() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "transport does not support flushing")
}
