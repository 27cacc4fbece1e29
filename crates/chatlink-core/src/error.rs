//! Error types for the streaming core.
//!
//! Errors are split per concern so adapters can map them independently:
//! event construction, response transport, and configuration.

use thiserror::Error;

/// Errors raised while constructing an event.
///
/// Rendering never fails; everything that could make a frame invalid is
/// rejected here instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventError {
    /// A single-line field (event name, id, comment) contained a line break
    /// or was empty.
    #[error("Invalid {field}: {value:?}")]
    InvalidField {
        /// Which field was rejected.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The payload could not be serialized to JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors reported by a response context while writing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    /// The client went away or the response was already finished.
    #[error("Response closed")]
    Closed,

    /// Underlying transport failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Configuration validation error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("Stop poll interval ({poll_ms}ms) exceeds stop timeout ({timeout_ms}ms)")]
    PollExceedsTimeout { poll_ms: u128, timeout_ms: u128 },
}
