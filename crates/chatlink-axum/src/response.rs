//! Channel-backed response context.
//!
//! Bridges the core's [`ResponseSink`] port to an axum streaming body. The
//! session loop writes through a [`ChannelResponse`]; the handler holds the
//! matching [`PendingResponse`] and turns it into the HTTP response once the
//! loop has committed the response head.

use std::io;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use chatlink_core::{ResponseSink, SinkError};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::warn;

use crate::error::HttpError;

/// Number of chunks buffered between the session loop and the socket.
pub const DEFAULT_BODY_BUFFER: usize = 16;

type BodyItem = Result<Bytes, io::Error>;

/// Writable side of a streaming response, lent to a session loop.
#[derive(Debug)]
pub struct ChannelResponse {
    headers: HeaderMap,
    commit: Option<oneshot::Sender<HeaderMap>>,
    body: Option<mpsc::Sender<BodyItem>>,
    gone: CancellationToken,
}

/// Handler side of a streaming response.
///
/// Dropping it, or the body stream built from it, cancels the writer's
/// disconnect token.
#[derive(Debug)]
pub struct PendingResponse {
    commit: oneshot::Receiver<HeaderMap>,
    body: mpsc::Receiver<BodyItem>,
    guard: DropGuard,
}

/// Create a connected response pair with room for `buffer` in-flight chunks.
pub fn channel_response(buffer: usize) -> (ChannelResponse, PendingResponse) {
    let (commit_tx, commit_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(buffer.max(1));
    let gone = CancellationToken::new();
    (
        ChannelResponse {
            headers: HeaderMap::new(),
            commit: Some(commit_tx),
            body: Some(body_tx),
            gone: gone.clone(),
        },
        PendingResponse {
            commit: commit_rx,
            body: body_rx,
            guard: gone.drop_guard(),
        },
    )
}

impl ChannelResponse {
    /// Hand the response head to the handler. Later header changes are ignored.
    fn commit(&mut self) {
        if let Some(commit) = self.commit.take() {
            // The handler may already be gone; writes will report it.
            let _ = commit.send(std::mem::take(&mut self.headers));
        }
    }

    async fn write(&mut self, chunk: Bytes, last: bool) -> Result<(), SinkError> {
        self.commit();
        let body = if last {
            self.body.take()
        } else {
            self.body.clone()
        };
        let body = body.ok_or(SinkError::Closed)?;
        body.send(Ok(chunk)).await.map_err(|_| SinkError::Closed)
    }
}

#[async_trait]
impl ResponseSink for ChannelResponse {
    fn set_header(&mut self, name: &str, value: &str) {
        if self.commit.is_none() {
            warn!(header = name, "Response already committed, header ignored");
            return;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => warn!(header = name, "Invalid response header ignored"),
        }
    }

    fn set_chunked(&mut self) {
        // Hyper frames a body without a known length as chunked, so switching
        // transfer mode is just committing the head.
        self.commit();
    }

    async fn send_chunk(&mut self, chunk: Bytes) -> Result<(), SinkError> {
        self.write(chunk, false).await
    }

    async fn send_final_chunk(&mut self, chunk: Bytes) -> Result<(), SinkError> {
        self.write(chunk, true).await
    }

    fn disconnected(&self) -> Option<CancellationToken> {
        Some(self.gone.clone())
    }
}

impl PendingResponse {
    /// Wait for the loop to commit the head, then build the streaming response.
    pub async fn into_response(self) -> Response {
        let Self {
            commit,
            body,
            guard,
        } = self;
        match commit.await {
            Ok(headers) => {
                // The guard lives as long as the body stream.
                let stream = ReceiverStream::new(body).map(move |item| {
                    let _guard = &guard;
                    item
                });
                let mut response = Response::new(Body::from_stream(stream));
                *response.headers_mut() = headers;
                response
            }
            Err(_) => HttpError::Internal(
                "Event stream ended before the response was committed".to_string(),
            )
            .into_response(),
        }
    }
}
