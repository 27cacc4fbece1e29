//! Shared application state type.

use crate::bootstrap::AxumContext;
use std::sync::Arc;

/// Application state shared across all handlers.
///
/// An Arc-wrapped `AxumContext` holding the session slot and the server
/// configuration.
pub type AppState = Arc<AxumContext>;
