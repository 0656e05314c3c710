//! Axum response transport.
//!
//! [`sse_response`] spawns the stream driver on its own task and hands back an
//! axum [`Response`] whose head is whatever the driver committed and whose
//! body is fed chunk by chunk as the driver flushes.
//!
//! The two sides are tied together:
//! - when the client goes away, hyper drops the body, the next flush fails
//!   and the driver stops;
//! - dropping the body also cancels the stream's token, so a driver parked on
//!   an idle source wakes up and stops too.

use std::convert::Infallible;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use axum::body::Body;
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use futures::Stream;
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use sse_core::Eventable;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::DropGuard;
use tracing::debug;

use super::ResponseWriter;
use crate::streamer::Streamer;

type Head = (StatusCode, HeaderMap);

/// A [`ResponseWriter`] that hands its head to a waiting handler and its body
/// chunks to an mpsc channel.
///
/// Writes are buffered; each flush sends the buffer as one body chunk.
#[derive(Debug)]
pub struct BodyWriter {
    headers: HeaderMap,
    head: Option<oneshot::Sender<Head>>,
    chunks: mpsc::Sender<Bytes>,
    buffer: BytesMut,
}

impl BodyWriter {
    /// Creates a writer that commits its head on `head` and sends body chunks on `chunks`.
    pub fn new(head: oneshot::Sender<Head>, chunks: mpsc::Sender<Bytes>) -> Self {
        Self {
            headers: HeaderMap::new(),
            head: Some(head),
            chunks,
            buffer: BytesMut::new(),
        }
    }

    fn commit(&mut self, status: StatusCode) {
        if let Some(head) = self.head.take() {
            let headers = std::mem::take(&mut self.headers);
            // The handler only stops waiting when the request itself is gone.
            let _ = head.send((status, headers));
        }
    }
}

#[async_trait]
impl ResponseWriter for BodyWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        self.commit(status);
    }

    async fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.commit(StatusCode::OK);
        self.buffer.extend_from_slice(buf);
        Ok(())
    }

    fn can_flush(&self) -> bool {
        true
    }

    async fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let chunk = self.buffer.split().freeze();
        self.chunks
            .send(chunk)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client disconnected"))
    }
}

impl Drop for BodyWriter {
    fn drop(&mut self) {
        // Unflushed bytes (e.g. a rejection body) still belong to the response.
        if !self.buffer.is_empty() {
            let _ = self.chunks.try_send(self.buffer.split().freeze());
        }
    }
}

/// Body stream that cancels the stream's token when dropped.
struct GuardedBody {
    inner: ReceiverStream<Bytes>,
    _guard: DropGuard,
}

impl Stream for GuardedBody {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(chunk)) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Serves `streamer` as an axum response.
///
/// The driver runs on a spawned task. `capacity` bounds how many flushed
/// chunks may wait for the client before the driver itself waits.
pub async fn sse_response<S>(streamer: Streamer<S>, capacity: usize) -> Response
where
    S: Stream + Send + 'static,
    S::Item: Eventable + Send + 'static,
    <S::Item as Eventable>::Data: Serialize + Send + Sync + 'static,
{
    let (head_tx, head_rx) = oneshot::channel();
    let (chunk_tx, chunk_rx) = mpsc::channel(capacity.max(1));
    let guard = streamer.token().clone().drop_guard();

    tokio::spawn(async move {
        let mut writer = BodyWriter::new(head_tx, chunk_tx);
        let outcome = streamer.serve(&mut writer).await;
        debug!(?outcome, "stream task finished");
    });

    match head_rx.await {
        Ok((status, headers)) => {
            let body = GuardedBody {
                inner: ReceiverStream::new(chunk_rx),
                _guard: guard,
            };
            let mut response = Response::new(Body::from_stream(body));
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            response
        }
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "event stream failed to start").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flush_sends_buffered_chunk() {
        let (head_tx, head_rx) = oneshot::channel();
        let (chunk_tx, mut chunk_rx) = mpsc::channel(4);
        let mut writer = BodyWriter::new(head_tx, chunk_tx);

        writer.write(b"data: 1\n").await.unwrap();
        writer.write(b"\n").await.unwrap();
        writer.flush().await.unwrap();

        let (status, _) = head_rx.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(chunk_rx.recv().await.unwrap(), Bytes::from_static(b"data: 1\n\n"));
    }

    #[tokio::test]
    async fn test_flush_fails_after_receiver_dropped() {
        let (head_tx, _head_rx) = oneshot::channel();
        let (chunk_tx, chunk_rx) = mpsc::channel(4);
        let mut writer = BodyWriter::new(head_tx, chunk_tx);
        drop(chunk_rx);

        writer.write(b"x").await.unwrap();
        let err = writer.flush().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_drop_sends_unflushed_bytes() {
        let (head_tx, _head_rx) = oneshot::channel();
        let (chunk_tx, mut chunk_rx) = mpsc::channel(4);
        let mut writer = BodyWriter::new(head_tx, chunk_tx);

        writer.write_status(StatusCode::BAD_REQUEST);
        writer.write(b"nope").await.unwrap();
        drop(writer);

        assert_eq!(chunk_rx.recv().await.unwrap(), Bytes::from_static(b"nope"));
        assert!(chunk_rx.recv().await.is_none());
    }
}
