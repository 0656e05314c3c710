//! Per-connection stream driver.
//!
//! A [`Streamer`] owns a cancellation token and a source of [`Eventable`]
//! items. [`Streamer::serve`] negotiates the stream, then forwards items to
//! the client as they arrive until the source ends or the token is cancelled:
//!
//! ```text
//! Negotiating --rejected--> Closed
//!      |
//!      v
//!  Streaming --source ended--> Goodbye --> Closed
//!      |  ^
//!      |  '-- item: write frame
//!      '-- cancelled / transport failure --> Closed
//! ```

use futures::{Stream, StreamExt};
use sse_core::{Eventable, GOODBYE};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::StreamError;
use crate::frame::write_event;
use crate::preamble::write_preamble;
use crate::transport::ResponseWriter;

/// How a stream ended.
#[derive(Debug)]
pub enum StreamOutcome {
    /// The transport could not stream; a 400 response was written instead.
    Rejected,
    /// The source ended and the goodbye event was sent.
    Completed {
        /// Number of source items written.
        events: usize,
    },
    /// The cancellation token fired before the source ended.
    Cancelled {
        /// Number of source items written.
        events: usize,
    },
    /// Writing to the transport failed.
    Aborted {
        /// Number of source items written.
        events: usize,
        /// The transport failure.
        error: StreamError,
    },
}

impl StreamOutcome {
    /// Number of source items written before the stream ended.
    pub fn events(&self) -> usize {
        match self {
            StreamOutcome::Rejected => 0,
            StreamOutcome::Completed { events }
            | StreamOutcome::Cancelled { events }
            | StreamOutcome::Aborted { events, .. } => *events,
        }
    }

    /// Returns true if the source was exhausted and the goodbye event sent.
    pub fn is_completed(&self) -> bool {
        matches!(self, StreamOutcome::Completed { .. })
    }
}

/// Turns a source of [`Eventable`] items into an SSE response.
///
/// # Example
///
/// ```rust,ignore
/// let token = CancellationToken::new();
/// let streamer = Streamer::new(token, futures::stream::iter(events));
/// let outcome = streamer.serve(&mut writer).await;
/// ```
pub struct Streamer<S> {
    token: CancellationToken,
    source: S,
}

impl<S> Streamer<S>
where
    S: Stream,
    S::Item: Eventable,
{
    /// Creates a streamer for `source`, cancelled by `token`.
    pub fn new(token: CancellationToken, source: S) -> Self {
        Self { token, source }
    }

    /// The token that cancels this stream.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Drives the connection until the source ends, the token is cancelled
    /// or the transport fails.
    ///
    /// Cancellation is checked between writes, never in the middle of one.
    /// When an item and cancellation are ready at the same time either may
    /// win.
    pub async fn serve<W>(self, conn: &mut W) -> StreamOutcome
    where
        W: ResponseWriter + ?Sized,
        <S::Item as Eventable>::Data: Sync,
    {
        let Streamer { token, source } = self;

        match write_preamble(conn).await {
            Ok(true) => {}
            Ok(false) => return StreamOutcome::Rejected,
            Err(error) => {
                warn!(error = %error, "failed to write stream preamble");
                return StreamOutcome::Aborted { events: 0, error };
            }
        }

        futures::pin_mut!(source);
        let mut events = 0;

        loop {
            tokio::select! {
                item = source.next() => match item {
                    Some(item) => {
                        let event = item.sse_event();
                        if let Err(error) = write_event(conn, &event).await {
                            warn!(error = %error, events, "event stream aborted");
                            return StreamOutcome::Aborted { events, error };
                        }
                        events += 1;
                    }
                    None => {
                        if let Err(error) = write_event(conn, &GOODBYE).await {
                            warn!(error = %error, events, "failed to write goodbye event");
                            return StreamOutcome::Aborted { events, error };
                        }
                        info!(events, "event stream completed");
                        return StreamOutcome::Completed { events };
                    }
                },
                _ = token.cancelled() => {
                    debug!(events, "event stream cancelled");
                    return StreamOutcome::Cancelled { events };
                }
            }
        }
    }
}

/// Error returned when the stream behind an [`EventSender`] has closed.
#[derive(Debug, Clone)]
pub struct SendError<T>(pub T);

impl<T> std::fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event stream closed")
    }
}

impl<T: std::fmt::Debug> std::error::Error for SendError<T> {}

/// Producer side of a [`channel`].
///
/// Dropping every sender ends the source, which makes the stream send its
/// goodbye event and close.
#[derive(Debug)]
pub struct EventSender<T> {
    sender: mpsc::Sender<T>,
}

impl<T> Clone for EventSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> EventSender<T> {
    /// Sends an item, waiting for buffer space.
    ///
    /// Returns an error if the stream has ended (client disconnected or cancelled).
    pub async fn send(&self, item: T) -> Result<(), SendError<T>> {
        self.sender.send(item).await.map_err(|e| SendError(e.0))
    }

    /// Sends several items in order, stopping at the first failure.
    pub async fn send_many(&self, items: impl IntoIterator<Item = T>) -> Result<(), SendError<T>> {
        for item in items {
            self.send(item).await?;
        }
        Ok(())
    }

    /// Tries to send an item without waiting.
    ///
    /// Returns an error if the buffer is full or the stream has ended.
    pub fn try_send(&self, item: T) -> Result<(), SendError<T>> {
        self.sender.try_send(item).map_err(|e| SendError(e.into_inner()))
    }

    /// Checks whether the stream has ended.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Creates a producer handle and a streamer connected by a bounded channel.
///
/// `capacity` is how many items may be queued before `send` waits.
pub fn channel<T>(capacity: usize, token: CancellationToken) -> (EventSender<T>, Streamer<ReceiverStream<T>>)
where
    T: Eventable,
{
    let (tx, rx) = mpsc::channel(capacity);
    (
        EventSender { sender: tx },
        Streamer::new(token, ReceiverStream::new(rx)),
    )
}
