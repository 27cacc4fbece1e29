//! Response context port.
//!
//! The HTTP layer owns the live response and lends it to a session through
//! this trait. Implementations decide how headers and chunks reach the wire.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::error::SinkError;

/// Writable response context for one push-stream connection.
///
/// Header changes are only meaningful before [`set_chunked`](Self::set_chunked)
/// is called; after that the response head is considered committed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponseSink: Send {
    /// Set a response header.
    fn set_header(&mut self, name: &str, value: &str);

    /// Switch the response to chunked delivery and commit the head.
    fn set_chunked(&mut self);

    /// Write one chunk.
    async fn send_chunk(&mut self, chunk: Bytes) -> Result<(), SinkError>;

    /// Write the last chunk and close the response.
    async fn send_final_chunk(&mut self, chunk: Bytes) -> Result<(), SinkError>;

    /// Token cancelled once the client has gone away.
    ///
    /// `None` when the transport cannot tell; a disconnect is then only
    /// seen by the next failing write.
    fn disconnected(&self) -> Option<CancellationToken> {
        None
    }
}
