#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Dev-dependencies used only by integration tests
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tower as _;

use tracing_subscriber as _; // Used by main.rs binary

pub mod bootstrap;
pub mod cli;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod producer;
pub mod response;
pub mod routes;
pub mod sse;
pub mod state;

// Re-export primary types
pub use bootstrap::{AxumContext, CorsConfig, ServerConfig, bootstrap, serve, start_server};
pub use cli::Cli;
pub use error::HttpError;
pub use producer::{pump_lines, spawn_stdin_producer};
pub use response::{ChannelResponse, PendingResponse, channel_response};
pub use routes::create_router;
pub use sse::SessionSlot;
pub use state::AppState;
