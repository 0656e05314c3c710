//! In-memory transport that records everything written to it.

use std::io;

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};

use super::{flush_unsupported, ResponseWriter};

/// A [`ResponseWriter`] that keeps the response in memory.
///
/// Bytes land in a pending buffer on `write` and move to the flushed body on
/// `flush`, so callers can see exactly what a client would have received.
#[derive(Debug)]
pub struct RecordingWriter {
    headers: HeaderMap,
    status: Option<StatusCode>,
    committed_at: Option<usize>,
    pending: Vec<u8>,
    flushed: Vec<u8>,
    flushes: usize,
    writes: usize,
    flushable: bool,
    fail_after: Option<usize>,
}

impl RecordingWriter {
    /// Creates a flushable recorder.
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
            status: None,
            committed_at: None,
            pending: Vec::new(),
            flushed: Vec::new(),
            flushes: 0,
            writes: 0,
            flushable: true,
            fail_after: None,
        }
    }

    /// Creates a recorder that reports no flush support.
    pub fn non_flushable() -> Self {
        Self {
            flushable: false,
            ..Self::new()
        }
    }

    /// Makes every write after the first `writes` fail with `BrokenPipe`.
    pub fn failing_after(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self
    }

    /// Committed status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body offset at which the status was committed.
    pub fn committed_at(&self) -> Option<usize> {
        self.committed_at
    }

    /// Every body byte written so far, flushed or not.
    pub fn body(&self) -> Vec<u8> {
        let mut body = self.flushed.clone();
        body.extend_from_slice(&self.pending);
        body
    }

    /// The body as text.
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body()).into_owned()
    }

    /// Bytes that have been flushed to the client.
    pub fn flushed(&self) -> &[u8] {
        &self.flushed
    }

    /// Number of successful flushes.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Flushed body split into SSE messages, each including its blank-line terminator.
    pub fn frames(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.flushed)
            .split_inclusive("\n\n")
            .map(str::to_string)
            .collect()
    }

    fn commit(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
            self.committed_at = Some(self.flushed.len() + self.pending.len());
        }
    }
}

impl Default for RecordingWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseWriter for RecordingWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        self.commit(status);
    }

    async fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.fail_after.is_some_and(|limit| self.writes >= limit) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"));
        }
        self.commit(StatusCode::OK);
        self.writes += 1;
        self.pending.extend_from_slice(buf);
        Ok(())
    }

    fn can_flush(&self) -> bool {
        self.flushable
    }

    async fn flush(&mut self) -> io::Result<()> {
        if !self.flushable {
            return Err(flush_unsupported());
        }
        self.flushed.append(&mut self.pending);
        self.flushes += 1;
        Ok(())
    }
}
