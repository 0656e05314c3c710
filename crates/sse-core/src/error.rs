//! Error types for SSE core operations.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur while preparing an event for the wire.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The event payload could not be encoded as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// A fault carried by an event in place of its payload.
///
/// Wraps any error type behind an `Arc` so events stay cheap to clone.
/// Its `Display` output is what reaches the client on the `data:` line.
#[derive(Clone)]
pub struct EventError(Arc<dyn std::error::Error + Send + Sync>);

impl EventError {
    /// Wraps an error value.
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self(Arc::from(err.into()))
    }

    /// Creates an error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(message.into())
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl From<String> for EventError {
    fn from(message: String) -> Self {
        Self::msg(message)
    }
}

impl From<&str> for EventError {
    fn from(message: &str) -> Self {
        Self::msg(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct DiskError;

    #[test]
    fn test_display_uses_wrapped_message() {
        assert_eq!(EventError::msg("boom").to_string(), "boom");
        assert_eq!(EventError::new(DiskError).to_string(), "disk on fire");
    }

    #[test]
    fn test_clone_shares_inner_error() {
        let err = EventError::new(DiskError);
        let copy = err.clone();
        assert!(Arc::ptr_eq(&err.0, &copy.0));
        assert_eq!(format!("{:?}", copy), "DiskError");
    }
}
