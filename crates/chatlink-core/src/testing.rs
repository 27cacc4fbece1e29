//! In-memory response context for tests.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::error::SinkError;
use crate::ports::ResponseSink;

#[derive(Debug, Default)]
struct Recorded {
    headers: Vec<(String, String)>,
    chunked: bool,
    chunks: Vec<Bytes>,
    closed: bool,
}

/// Records everything a session writes.
///
/// Clones share the same recording, so a test keeps one clone and hands the
/// other to the session.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Recorded>>,
    gone: CancellationToken,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All chunks written so far, the final chunk included.
    pub fn chunks(&self) -> Vec<Bytes> {
        self.with(|r| r.chunks.clone())
    }

    /// Value of the first header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<String> {
        self.with(|r| {
            r.headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
        })
    }

    pub fn is_chunked(&self) -> bool {
        self.with(|r| r.chunked)
    }

    /// Whether the final chunk has been written.
    pub fn is_closed(&self) -> bool {
        self.with(|r| r.closed)
    }

    /// Simulate the client going away.
    pub fn disconnect(&self) {
        self.gone.cancel();
    }

    fn with<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[async_trait]
impl ResponseSink for MemorySink {
    fn set_header(&mut self, name: &str, value: &str) {
        self.with(|r| r.headers.push((name.to_string(), value.to_string())));
    }

    fn set_chunked(&mut self) {
        self.with(|r| r.chunked = true);
    }

    async fn send_chunk(&mut self, chunk: Bytes) -> Result<(), SinkError> {
        self.with(|r| {
            if r.closed {
                return Err(SinkError::Closed);
            }
            r.chunks.push(chunk);
            Ok(())
        })
    }

    async fn send_final_chunk(&mut self, chunk: Bytes) -> Result<(), SinkError> {
        self.with(|r| {
            if r.closed {
                return Err(SinkError::Closed);
            }
            r.chunks.push(chunk);
            r.closed = true;
            Ok(())
        })
    }

    fn disconnected(&self) -> Option<CancellationToken> {
        Some(self.gone.clone())
    }
}
