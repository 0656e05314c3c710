//! Error types for SSE server operations.

use sse_core::CoreError;
use thiserror::Error;

/// Errors that can occur while writing an event stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Core SSE error
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Writing to or flushing the transport failed
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl StreamError {
    /// Returns true if the underlying transport failed.
    ///
    /// Callers use this on [`StreamOutcome::Aborted`](crate::StreamOutcome::Aborted)
    /// to tell a dropped client apart from an encoding fault.
    pub fn is_transport(&self) -> bool {
        matches!(self, StreamError::Transport(_))
    }
}

/// Result type alias using StreamError
pub type Result<T> = std::result::Result<T, StreamError>;
