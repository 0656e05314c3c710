//! Demo producer: one page of numbered ticks per connection.
//!
//! Each page ends by closing the channel, which makes the stream send its
//! goodbye event. The client reconnects with the next cursor and the pages
//! read as one continuous stream.

use std::time::Duration;

use serde::Serialize;
use sse_server::{Event, EventSender, Eventable};
use thiserror::Error;
use tracing::debug;

/// One item of the demo stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub seq: u64,
}

#[derive(Debug, Serialize)]
pub struct TickPayload {
    pub seq: u64,
}

impl Eventable for Tick {
    type Data = TickPayload;

    fn sse_event(self) -> Event<TickPayload> {
        Event::new(TickPayload { seq: self.seq })
            .with_id(self.seq.to_string())
            .with_event_type("tick")
    }
}

#[derive(Debug, Error)]
pub enum TickError {
    #[error("tick {0} is unavailable")]
    Unavailable(u64),
}

/// What the producer yields: a tick, or an error the client should see.
pub type TickItem = Result<Tick, TickError>;

/// The slice of the sequence one connection receives.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    /// Last sequence number the client has seen.
    pub cursor: u64,
    pub len: u64,
    pub interval: Duration,
    /// Sequence number to replace with an error.
    pub fail: Option<u64>,
}

impl Page {
    fn sequence(self) -> impl Iterator<Item = u64> {
        let cursor = self.cursor;
        (1..=self.len).map_while(move |offset| cursor.checked_add(offset))
    }
}

/// Sends one page of ticks, then drops the sender to end the stream.
///
/// Stops early if the stream goes away.
pub async fn run_page(sender: EventSender<TickItem>, page: Page) {
    let mut interval = (!page.interval.is_zero()).then(|| tokio::time::interval(page.interval));

    for seq in page.sequence() {
        if let Some(interval) = interval.as_mut() {
            interval.tick().await;
        }
        let item = if page.fail == Some(seq) {
            Err(TickError::Unavailable(seq))
        } else {
            Ok(Tick { seq })
        };
        if sender.send(item).await.is_err() {
            debug!(seq, "stream closed, stopping page");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sse_server::format_event;
    use tokio_util::sync::CancellationToken;

    fn page(cursor: u64, len: u64) -> Page {
        Page {
            cursor,
            len,
            interval: Duration::ZERO,
            fail: None,
        }
    }

    #[test]
    fn test_tick_event() {
        let frame = format_event(&Tick { seq: 4 }.sse_event()).unwrap();
        assert_eq!(frame, "id: 4\nevent: tick\ndata: {\"seq\":4}\n\n");
    }

    #[test]
    fn test_page_sequence() {
        assert_eq!(page(5, 3).sequence().collect::<Vec<_>>(), vec![6, 7, 8]);
        assert_eq!(page(0, 0).sequence().count(), 0);
        assert_eq!(page(u64::MAX, 2).sequence().count(), 0);
    }

    #[tokio::test]
    async fn test_run_page_sends_page_then_closes() {
        let (sender, streamer) = sse_server::channel(8, CancellationToken::new());
        run_page(sender, Page { fail: Some(2), ..page(0, 3) }).await;

        let mut writer = sse_server::RecordingWriter::new();
        let outcome = streamer.serve(&mut writer).await;

        assert!(outcome.is_completed());
        assert_eq!(outcome.events(), 3);
        let frames = writer.frames();
        assert_eq!(frames[2], "event: err\ndata: tick 2 is unavailable\n\n");
    }

    #[tokio::test]
    async fn test_run_page_stops_when_stream_is_gone() {
        let (sender, streamer) = sse_server::channel::<TickItem>(1, CancellationToken::new());
        drop(streamer);
        run_page(sender, page(0, 1000)).await;
    }
}
