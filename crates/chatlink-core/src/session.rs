//! Streaming session: one push-response connection.
//!
//! A [`StreamSession`] owns an outbound queue and the event loop that drains
//! it into a borrowed [`ResponseSink`]. The owner launches the loop detached
//! and later calls [`StreamSession::request_stop`], which waits for the loop
//! to finish up to a bounded timeout.
//!
//! State machine:
//!
//! ```text
//! Running --request_stop--> Stopping --loop finalized--> Done
//!    \_______________cancel / write failure / panic_____/
//! ```
//!
//! Every exit path finishes the same way: the close sentinel is written as
//! the final chunk (best effort) and the state becomes `Done`.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::SinkError;
use crate::events::{CloseEvent, CommentEvent, ServerEvent};
use crate::ports::ResponseSink;
use crate::queue::{EventSender, QueueReceiver, outbound_queue};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Loop is (or will be) delivering events.
    Running,
    /// Stop requested; loop is draining the queue.
    Stopping,
    /// Terminal frame sent (or attempted); loop is gone.
    Done,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Result of a graceful stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The loop finished within the timeout.
    Completed,
    /// The timeout elapsed first. The session must be discarded anyway.
    TimedOut,
}

/// Why the drain loop ended.
#[derive(Debug)]
enum LoopExit {
    Stopped,
    Cancelled,
    Disconnected,
    WriteFailed(SinkError),
}

/// One active push-stream connection.
pub struct StreamSession {
    id: Uuid,
    config: SessionConfig,
    /// Connection/process lifetime, owned by the caller.
    cancel: CancellationToken,
    /// Internal stop request.
    stop: CancellationToken,
    state: watch::Sender<SessionState>,
    delivered: AtomicU64,
    sender: EventSender,
    receiver: Mutex<Option<QueueReceiver>>,
}

impl fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("delivered", &self.delivered())
            .finish_non_exhaustive()
    }
}

impl StreamSession {
    /// Create a session bound to an external cancellation token.
    pub fn new(cancel: CancellationToken, config: SessionConfig) -> Self {
        let id = Uuid::new_v4();
        let (sender, receiver) = outbound_queue(id);
        let (state, _) = watch::channel(SessionState::Running);
        Self {
            id,
            config,
            cancel,
            stop: CancellationToken::new(),
            state,
            delivered: AtomicU64::new(0),
            sender,
            receiver: Mutex::new(Some(receiver)),
        }
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Producer handle for this session's queue.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Enqueue an event. Never blocks, never fails observably.
    pub fn push<E: ServerEvent + 'static>(&self, event: E) {
        self.sender.send(event);
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Completion flag: true once the loop has finalized.
    pub fn is_finished(&self) -> bool {
        self.state() == SessionState::Done
    }

    /// Number of events written so far. Diagnostic only.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Wait, without a bound, until the loop has finalized.
    pub async fn finished(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|s| *s == SessionState::Done).await;
    }

    /// Launch the event loop as a detached task.
    ///
    /// The handle may be dropped; the loop reports nothing through it.
    pub fn spawn<S>(self: &Arc<Self>, sink: S) -> JoinHandle<()>
    where
        S: ResponseSink + 'static,
    {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.run(sink).await })
    }

    /// Run the event loop on the given response until stop or cancellation.
    ///
    /// Only the first call runs; later calls return immediately.
    pub async fn run<S: ResponseSink>(&self, mut sink: S) {
        let Some(receiver) = self.take_receiver() else {
            warn!(session_id = %self.id, "Event loop already started for this session");
            return;
        };

        info!(session_id = %self.id, "Event stream opened");

        let outcome = AssertUnwindSafe(self.drive(&mut sink, receiver))
            .catch_unwind()
            .await;

        match outcome {
            Ok(LoopExit::Stopped) => debug!(session_id = %self.id, "Event loop stopped"),
            Ok(LoopExit::Cancelled) => debug!(session_id = %self.id, "Event loop cancelled"),
            Ok(LoopExit::Disconnected) => info!(session_id = %self.id, "Client disconnected"),
            Ok(LoopExit::WriteFailed(e)) => {
                warn!(session_id = %self.id, error = %e, "Event stream write failed");
            }
            Err(panic) => {
                error!(
                    session_id = %self.id,
                    panic = %panic_message(panic.as_ref()),
                    "Event loop panicked"
                );
            }
        }

        self.finalize(&mut sink).await;
    }

    /// Ask the loop to stop and wait for it to finish.
    ///
    /// Waits in `stop_poll_interval` slices up to `stop_timeout`, then gives
    /// up. Safe to call more than once.
    pub async fn request_stop(&self) -> StopOutcome {
        self.state.send_if_modified(|state| {
            if *state == SessionState::Running {
                *state = SessionState::Stopping;
                true
            } else {
                false
            }
        });
        self.stop.cancel();

        let mut rx = self.state.subscribe();
        let deadline = Instant::now() + self.config.stop_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(
                    session_id = %self.id,
                    timeout_ms = self.config.stop_timeout.as_millis(),
                    "Event stream did not finish in time, abandoning it"
                );
                return StopOutcome::TimedOut;
            }

            let slice = self.config.stop_poll_interval.min(remaining);
            match timeout(slice, rx.wait_for(|s| *s == SessionState::Done)).await {
                Ok(_) => return StopOutcome::Completed,
                Err(_) => debug!(session_id = %self.id, "Waiting for event stream to finish"),
            }
        }
    }

    fn take_receiver(&self) -> Option<QueueReceiver> {
        self.receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    async fn drive<S: ResponseSink>(&self, sink: &mut S, mut receiver: QueueReceiver) -> LoopExit {
        sink.set_header("Content-Type", "text/event-stream");
        sink.set_header("Cache-Control", "no-cache");
        sink.set_header("Connection", "keep-alive");
        sink.set_chunked();

        let disconnected = sink.disconnected();
        let mut keep_alive = self.config.keep_alive.map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return LoopExit::Cancelled,
                () = client_gone(disconnected.as_ref()) => return LoopExit::Disconnected,
                next = receiver.recv() => {
                    // The session keeps a sender alive, so the queue only
                    // reports closed if that invariant is broken.
                    let Some(event) = next else {
                        return LoopExit::Stopped;
                    };
                    if let Err(exit) = self.deliver(sink, event.build()).await {
                        return exit;
                    }
                    if let Some(ticker) = keep_alive.as_mut() {
                        ticker.reset();
                    }
                }
                () = self.stop.cancelled() => return self.drain_remaining(sink, &mut receiver).await,
                () = next_tick(&mut keep_alive) => {
                    if let Err(exit) = self.write_chunk(sink, CommentEvent::ping().build()).await {
                        return exit;
                    }
                }
            }
        }
    }

    /// Deliver whatever was queued before the stop request.
    async fn drain_remaining<S: ResponseSink>(
        &self,
        sink: &mut S,
        receiver: &mut QueueReceiver,
    ) -> LoopExit {
        while let Ok(event) = receiver.try_recv() {
            if let Err(exit) = self.deliver(sink, event.build()).await {
                return exit;
            }
        }
        LoopExit::Stopped
    }

    async fn deliver<S: ResponseSink>(&self, sink: &mut S, chunk: Bytes) -> Result<(), LoopExit> {
        self.write_chunk(sink, chunk).await?;
        let delivered = self.delivered.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(session_id = %self.id, delivered, "Event delivered");
        Ok(())
    }

    async fn write_chunk<S: ResponseSink>(&self, sink: &mut S, chunk: Bytes) -> Result<(), LoopExit> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(LoopExit::Cancelled),
            result = sink.send_chunk(chunk) => result.map_err(LoopExit::WriteFailed),
        }
    }

    async fn finalize<S: ResponseSink>(&self, sink: &mut S) {
        let terminal = CloseEvent.build();
        let attempt = AssertUnwindSafe(timeout(
            self.config.stop_timeout,
            sink.send_final_chunk(terminal),
        ))
        .catch_unwind()
        .await;

        match attempt {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => {
                debug!(session_id = %self.id, error = %e, "Terminal frame not delivered");
            }
            Ok(Err(_)) => debug!(session_id = %self.id, "Terminal frame write timed out"),
            Err(panic) => debug!(
                session_id = %self.id,
                panic = %panic_message(panic.as_ref()),
                "Terminal frame write panicked"
            ),
        }

        self.state.send_replace(SessionState::Done);
        info!(
            session_id = %self.id,
            delivered = self.delivered(),
            "Event stream closed"
        );
    }
}

async fn client_gone(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending::<()>().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
