//! Event emitter trait for producers.
//!
//! This module defines the abstraction producers use to push chat events.
//! Implementations handle transport details (session queues, SSE slots, etc.).

use crate::events::ChatEvent;

/// Trait for emitting chat events.
///
/// Keeps queue and channel types out of producer code.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and contexts without a connected client
/// - `EventSender` - Pushes straight into one session's outbound queue
/// - Adapter-specific implementations (the axum session slot)
///
/// # Example
///
/// ```ignore
/// fn on_chat_line(&self, emitter: &dyn ChatEventEmitter, line: &str) {
///     emitter.emit(ChatEvent::new_message("Ayla", line, None));
/// }
/// ```
pub trait ChatEventEmitter: Send + Sync {
    /// Emit a chat event.
    ///
    /// Must not block and must not fail observably.
    fn emit(&self, event: ChatEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn ChatEventEmitter>;
}

/// A no-op emitter that discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl ChatEventEmitter for NoopEmitter {
    fn emit(&self, _event: ChatEvent) {}

    fn clone_box(&self) -> Box<dyn ChatEventEmitter> {
        Box::new(self.clone())
    }
}
