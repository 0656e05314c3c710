//! Stream negotiation: response headers, status and the opening `hello` event.

use http::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONNECTION, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS,
};
use http::{HeaderValue, StatusCode};
use sse_core::HELLO;
use tracing::{debug, warn};

use crate::error::Result;
use crate::frame::write_event;
use crate::transport::ResponseWriter;

/// Body sent to clients whose transport cannot stream.
pub const STREAMING_NOT_SUPPORTED: &str = "Streaming Not Supported";

/// Negotiates an event stream on `conn`.
///
/// Returns `Ok(false)` if the transport cannot flush. In that case a single
/// `400 Bad Request` with a plain-text body has been written and the caller
/// must not write anything else. Otherwise commits the SSE headers with a
/// `200 OK`, sends [`HELLO`] and returns `Ok(true)`.
pub async fn write_preamble<W: ResponseWriter + ?Sized>(conn: &mut W) -> Result<bool> {
    if !conn.can_flush() {
        warn!("transport cannot flush, rejecting event stream");
        let headers = conn.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        conn.write_status(StatusCode::BAD_REQUEST);
        conn.write(STREAMING_NOT_SUPPORTED.as_bytes()).await?;
        return Ok(false);
    }

    let headers = conn.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    conn.write_status(StatusCode::OK);

    write_event(conn, &HELLO).await?;
    debug!("event stream opened");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingWriter;

    #[tokio::test]
    async fn test_preamble_headers_and_hello() {
        let mut writer = RecordingWriter::new();
        assert!(write_preamble(&mut writer).await.unwrap());

        assert_eq!(writer.status(), Some(StatusCode::OK));
        assert_eq!(writer.committed_at(), Some(0));

        let headers = writer.headers();
        assert_eq!(headers[CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[CACHE_CONTROL], "no-cache");
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        assert_eq!(writer.frames(), vec!["retry: 1000\nevent: open\ndata: \"hello\"\n\n"]);
        assert_eq!(writer.flush_count(), 1);
    }

    #[tokio::test]
    async fn test_preamble_rejects_non_flushable_transport() {
        let mut writer = RecordingWriter::non_flushable();
        assert!(!write_preamble(&mut writer).await.unwrap());

        assert_eq!(writer.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(writer.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(writer.body_string(), "Streaming Not Supported");
        assert!(writer.frames().is_empty());
    }

    #[tokio::test]
    async fn test_preamble_propagates_transport_failure() {
        let mut writer = RecordingWriter::new().failing_after(0);
        assert!(write_preamble(&mut writer).await.is_err());
    }
}
