#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod events;
pub mod ports;
pub mod queue;
pub mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types for convenience
pub use config::{DEFAULT_STOP_POLL_INTERVAL, DEFAULT_STOP_TIMEOUT, SessionConfig};
pub use error::{ConfigError, EventError, SinkError};
pub use events::{
    CLOSE_EVENT_NAME, CLOSE_FRAME, ChatEvent, CloseEvent, CommentEvent, DataEvent, ServerEvent,
};
pub use ports::{ChatEventEmitter, NoopEmitter, ResponseSink};
pub use queue::{EventSender, QueuedEvent};
pub use session::{SessionState, StopOutcome, StreamSession};

// Silence unused dev-dependency warnings for crates only used by mocks
#[cfg(test)]
use mockall as _;
