//! HTTP request handlers for the Axum web server.
//!
//! Handlers are thin wrappers that delegate to the session slot.

pub mod events;
pub mod messages;
pub mod session;
