//! Message submission handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chatlink_core::ChatEvent;
use tracing::debug;

use crate::dto::{PostMessageRequest, PostMessageResponse};
use crate::error::HttpError;
use crate::state::AppState;

/// Queue a chat message for the connected client.
///
/// Responds `202 Accepted` whether or not a client is connected; `queued`
/// reports which.
pub async fn post(
    State(state): State<AppState>,
    Json(req): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<PostMessageResponse>), HttpError> {
    if req.sender.trim().is_empty() {
        return Err(HttpError::BadRequest("sender must not be empty".to_string()));
    }
    if req.content.is_empty() {
        return Err(HttpError::BadRequest("content must not be empty".to_string()));
    }

    let frame = ChatEvent::new_message(req.sender, req.content, req.channel).to_frame()?;
    let queued = state.slot.push(frame);
    debug!(queued, "Message submitted");

    Ok((StatusCode::ACCEPTED, Json(PostMessageResponse { queued })))
}
