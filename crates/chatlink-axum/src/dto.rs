//! Request and response bodies for the JSON endpoints.

use chatlink_core::SessionState;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageRequest {
    pub sender: String,
    pub content: String,
    #[serde(default)]
    pub channel: Option<String>,
}

/// Reply to `POST /api/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct PostMessageResponse {
    /// Whether a connected client's queue received the event.
    pub queued: bool,
}

/// Reply to `GET /api/session`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<SessionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered: Option<u64>,
}

impl SessionStatus {
    pub const fn disconnected() -> Self {
        Self {
            connected: false,
            session_id: None,
            state: None,
            delivered: None,
        }
    }
}
