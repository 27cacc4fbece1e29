//! Port definitions (trait abstractions) for the streaming core.
//!
//! Ports define the interfaces the session expects from its surroundings.
//! They contain no HTTP framework types.
//!
//! # Design Rules
//!
//! - No axum/hyper types in any signature
//! - The response context is lent to the session for the loop's lifetime
//! - Producers depend on the emitter port, never on a concrete adapter

pub mod event_emitter;
pub mod response_sink;

pub use event_emitter::{ChatEventEmitter, NoopEmitter};
pub use response_sink::ResponseSink;

#[cfg(test)]
pub use response_sink::MockResponseSink;
