//! SSE Frame Writer
//!
//! Renders one [`Event`] into the SSE wire grammar and pushes it through a
//! [`ResponseWriter`], flushing immediately:
//!
//! ```text
//! retry: <integer>\n        (omitted if zero)
//! id: <string>\n            (omitted if empty)
//! event: <string>\n         (omitted if empty)
//! data: <json payload>\n\n
//! ```
//!
//! Error events render as `event: err` followed by the plain-text error
//! message on the `data:` line, and nothing else.

use std::fmt::Write as _;

use serde::Serialize;
use sse_core::{CoreError, Event, ERROR_EVENT_TYPE};
use tracing::{error, warn};

use crate::error::{Result, StreamError};
use crate::transport::ResponseWriter;

/// Renders an event to its SSE wire form.
///
/// Fails only if the payload cannot be serialized.
pub fn format_event<D: Serialize>(event: &Event<D>) -> Result<String> {
    if let Some(err) = event.error_ref() {
        return Ok(format_error(&err.to_string()));
    }
    let json = event.encode_data()?.unwrap_or_default();

    let mut frame = String::with_capacity(json.len() + 32);
    if event.retry != 0 {
        let _ = writeln!(frame, "retry: {}", event.retry);
    }
    if !event.id.is_empty() {
        let _ = writeln!(frame, "id: {}", single_line(&event.id));
    }
    if !event.event_type.is_empty() {
        let _ = writeln!(frame, "event: {}", single_line(&event.event_type));
    }
    let _ = write!(frame, "data: {}\n\n", json);
    Ok(frame)
}

/// Renders an error frame. Multi-line messages get one `data:` line per line.
pub fn format_error(message: &str) -> String {
    let mut frame = format!("event: {}\n", ERROR_EVENT_TYPE);
    let normalized = message.replace("\r\n", "\n");
    for line in normalized.split(['\n', '\r']) {
        let _ = writeln!(frame, "data: {}", line);
    }
    frame.push('\n');
    frame
}

/// Writes one event to the transport and flushes it.
///
/// Error events are logged once they reach the client. A payload that fails to
/// serialize is replaced by an error frame instead of ending the stream.
/// Transport write and flush failures are returned to the caller.
pub async fn write_event<W, D>(conn: &mut W, event: &Event<D>) -> Result<()>
where
    W: ResponseWriter + ?Sized,
    D: Serialize + Sync,
{
    let frame = match format_event(event) {
        Ok(frame) => frame,
        Err(StreamError::Core(CoreError::Serialization(err))) => {
            warn!(error = %err, id = %event.id, "event payload failed to serialize");
            format_error(&format!("failed to serialize event: {}", err))
        }
        Err(other) => return Err(other),
    };

    let sent = send(conn, frame.as_bytes()).await;

    if let (Ok(()), Some(err)) = (&sent, event.error_ref()) {
        error!(error = %err, "error event sent to client");
    }

    sent
}

async fn send<W: ResponseWriter + ?Sized>(conn: &mut W, frame: &[u8]) -> Result<()> {
    conn.write(frame).await?;
    conn.flush().await?;
    Ok(())
}

/// Field values other than `data` must stay on one line.
fn single_line(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains(['\n', '\r']) {
        value.replace("\r\n", " ").replace(['\n', '\r'], " ").into()
    } else {
        value.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingWriter;
    use serde_json::json;
    use sse_core::{JsonValue, GOODBYE, HELLO};

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not today"))
        }
    }

    #[test]
    fn test_format_full_event() {
        let event = Event::new(json!({"x": 1})).with_id("42").with_retry(500);
        assert_eq!(format_event(&event).unwrap(), "retry: 500\nid: 42\ndata: {\"x\":1}\n\n");
    }

    #[test]
    fn test_format_field_order() {
        let event = Event::new("v").with_event_type("t").with_id("i").with_retry(1);
        assert_eq!(format_event(&event).unwrap(), "retry: 1\nid: i\nevent: t\ndata: \"v\"\n\n");
    }

    #[test]
    fn test_format_data_only() {
        let event = Event::new(json!([1, 2]));
        assert_eq!(format_event(&event).unwrap(), "data: [1,2]\n\n");
    }

    #[test]
    fn test_format_sentinels() {
        assert_eq!(format_event(&HELLO).unwrap(), "retry: 1000\nevent: open\ndata: \"hello\"\n\n");
        assert_eq!(format_event(&GOODBYE).unwrap(), "retry: 10\nevent: close\ndata: \"byebye\"\n\n");
    }

    #[test]
    fn test_format_error_ignores_optional_fields() {
        let event: Event<JsonValue> = Event::error("boom")
            .with_id("42")
            .with_event_type("trade")
            .with_retry(500);
        assert_eq!(format_event(&event).unwrap(), "event: err\ndata: boom\n\n");
    }

    #[test]
    fn test_format_error_is_not_json_encoded() {
        let event: Event<JsonValue> = Event::error("say \"hi\"");
        assert_eq!(format_event(&event).unwrap(), "event: err\ndata: say \"hi\"\n\n");
    }

    #[test]
    fn test_format_multiline_error() {
        assert_eq!(format_error("first\r\nsecond"), "event: err\ndata: first\ndata: second\n\n");
        assert_eq!(format_error(""), "event: err\ndata: \n\n");
    }

    #[test]
    fn test_format_strips_newlines_from_fields() {
        let event = Event::new(1).with_id("a\nb").with_event_type("c\r\nd");
        assert_eq!(format_event(&event).unwrap(), "id: a b\nevent: c d\ndata: 1\n\n");
    }

    #[test]
    fn test_format_unserializable_payload() {
        let err = format_event(&Event::new(Unserializable)).unwrap_err();
        assert!(matches!(err, StreamError::Core(CoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_write_event_flushes_each_frame() {
        let mut writer = RecordingWriter::new();
        write_event(&mut writer, &Event::new(json!({"x": 1}))).await.unwrap();
        write_event(&mut writer, &Event::new(json!({"x": 2}))).await.unwrap();

        assert_eq!(writer.flush_count(), 2);
        assert_eq!(writer.frames(), vec!["data: {\"x\":1}\n\n", "data: {\"x\":2}\n\n"]);
    }

    #[tokio::test]
    async fn test_write_event_substitutes_serialization_failure() {
        let mut writer = RecordingWriter::new();
        let event = Event::new(Unserializable).with_id("7");
        write_event(&mut writer, &event).await.unwrap();

        let body = writer.body_string();
        assert!(body.starts_with("event: err\ndata: failed to serialize event: "));
        assert!(body.contains("not today"));
        assert!(!body.contains("id: 7"));
        assert!(body.ends_with("\n\n"));
    }

    #[tokio::test]
    async fn test_write_event_reports_transport_failure() {
        let mut writer = RecordingWriter::new().failing_after(0);
        let err = write_event(&mut writer, &HELLO).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_write_event_reports_flush_failure() {
        let mut writer = RecordingWriter::non_flushable();
        let err = write_event(&mut writer, &HELLO).await.unwrap_err();
        assert!(err.is_transport());
    }
}
