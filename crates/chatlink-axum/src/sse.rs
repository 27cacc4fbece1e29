//! SSE session slot for the single connected client.
//!
//! The slot owns at most one active [`StreamSession`]. Accepting a new
//! connection replaces the previous session, which is stopped in the
//! background with the bounded graceful-stop protocol. The slot implements
//! the core emitter port so producers never touch sessions directly.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chatlink_core::{
    ChatEvent, ChatEventEmitter, ServerEvent, SessionConfig, StopOutcome, StreamSession,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::response::{DEFAULT_BODY_BUFFER, PendingResponse, channel_response};

#[derive(Debug)]
struct SlotInner {
    active: Mutex<Option<Arc<StreamSession>>>,
    shutdown: CancellationToken,
    config: SessionConfig,
}

/// Holder of the active push-stream session.
///
/// Cheap to clone; clones share the same slot.
#[derive(Debug, Clone)]
pub struct SessionSlot {
    inner: Arc<SlotInner>,
}

impl SessionSlot {
    /// Create an empty slot.
    ///
    /// Each session gets a child of `shutdown`, so cancelling it ends every
    /// stream without waiting for a stop request.
    pub fn new(shutdown: CancellationToken, config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(SlotInner {
                active: Mutex::new(None),
                shutdown,
                config,
            }),
        }
    }

    /// Accept a client: start a session on a fresh response and make it the
    /// active one.
    pub fn connect(&self) -> (Arc<StreamSession>, PendingResponse) {
        let (sink, pending) = channel_response(DEFAULT_BODY_BUFFER);
        let session = Arc::new(StreamSession::new(
            self.inner.shutdown.child_token(),
            self.inner.config,
        ));
        drop(session.spawn(sink));

        let previous = self.lock().replace(Arc::clone(&session));
        info!(session_id = %session.id(), "Client connected");

        if let Some(previous) = previous {
            info!(
                session_id = %previous.id(),
                replaced_by = %session.id(),
                "Replacing previous client session"
            );
            tokio::spawn(async move {
                if previous.request_stop().await == StopOutcome::TimedOut {
                    warn!(session_id = %previous.id(), "Replaced session did not stop in time");
                }
            });
        }

        (session, pending)
    }

    /// The active session, if its loop has not finished yet.
    pub fn active(&self) -> Option<Arc<StreamSession>> {
        self.lock()
            .as_ref()
            .filter(|session| !session.is_finished())
            .cloned()
    }

    /// Enqueue an event for the connected client.
    ///
    /// Returns whether a client session received it. Without one the event
    /// is dropped.
    pub fn push<E: ServerEvent + 'static>(&self, event: E) -> bool {
        match self.active() {
            Some(session) => {
                session.push(event);
                true
            }
            None => {
                trace!("No client connected, dropping event");
                false
            }
        }
    }

    /// Stop the active session, if any, and release it.
    pub async fn shutdown(&self) -> Option<StopOutcome> {
        let session = self.lock().take()?;
        let outcome = session.request_stop().await;
        debug!(session_id = %session.id(), ?outcome, "Client session stopped");
        Some(outcome)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<StreamSession>>> {
        self.inner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChatEventEmitter for SessionSlot {
    fn emit(&self, event: ChatEvent) {
        match event.to_frame() {
            Ok(frame) => {
                self.push(frame);
            }
            Err(e) => warn!("Failed to render chat event: {}", e),
        }
    }

    fn clone_box(&self) -> Box<dyn ChatEventEmitter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatlink_core::{CLOSE_FRAME, DataEvent, SessionState};
    use http_body_util::BodyExt;
    use std::time::Duration;

    fn slot() -> SessionSlot {
        SessionSlot::new(CancellationToken::new(), SessionConfig::default())
    }

    #[test]
    fn test_push_without_client() {
        let slot = slot();
        assert!(slot.active().is_none());
        assert!(!slot.push(DataEvent::new("nobody")));
    }

    #[tokio::test]
    async fn test_shutdown_without_client() {
        assert_eq!(slot().shutdown().await, None);
    }

    #[tokio::test]
    async fn test_connect_push_and_shutdown() {
        let slot = slot();
        let (session, pending) = slot.connect();
        let response = pending.into_response().await;

        assert!(slot.push(DataEvent::new("one")));
        slot.emit(ChatEvent::notice("two"));

        assert_eq!(slot.shutdown().await, Some(StopOutcome::Completed));
        assert_eq!(session.state(), SessionState::Done);
        assert!(slot.active().is_none());

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("data: one\n\nevent: notice\n"));
        assert!(text.ends_with(std::str::from_utf8(CLOSE_FRAME).unwrap()));
    }

    #[tokio::test]
    async fn test_new_connection_replaces_previous() {
        let slot = slot();
        let (first, first_pending) = slot.connect();
        let first_response = first_pending.into_response().await;
        let (second, _second_pending) = slot.connect();

        let body = tokio::time::timeout(
            Duration::from_secs(2),
            first_response.into_body().collect(),
        )
        .await
        .expect("replaced stream did not end")
        .unwrap()
        .to_bytes();
        assert_eq!(&body[..], CLOSE_FRAME);
        tokio::time::timeout(Duration::from_secs(1), first.finished())
            .await
            .unwrap();

        let active = slot.active().unwrap();
        assert_eq!(active.id(), second.id());
    }

    #[tokio::test]
    async fn test_client_disconnect_releases_slot() {
        let slot = slot();
        let (session, pending) = slot.connect();
        let response = pending.into_response().await;
        assert!(slot.active().is_some());

        drop(response);
        tokio::time::timeout(Duration::from_secs(1), session.finished())
            .await
            .expect("session did not notice the disconnect");

        assert!(slot.active().is_none());
        assert!(!slot.push(DataEvent::new("nobody listening")));
    }

    #[tokio::test]
    async fn test_shutdown_token_ends_stream() {
        let shutdown = CancellationToken::new();
        let slot = SessionSlot::new(shutdown.clone(), SessionConfig::default());
        let (session, pending) = slot.connect();
        let response = pending.into_response().await;

        shutdown.cancel();
        let body = tokio::time::timeout(Duration::from_secs(2), response.into_body().collect())
            .await
            .expect("stream did not end on shutdown")
            .unwrap()
            .to_bytes();
        assert_eq!(&body[..], CLOSE_FRAME);
        tokio::time::timeout(Duration::from_secs(1), session.finished())
            .await
            .unwrap();
    }
}
