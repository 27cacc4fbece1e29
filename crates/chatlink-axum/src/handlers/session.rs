//! Session status handler.

use axum::Json;
use axum::extract::State;

use crate::dto::SessionStatus;
use crate::state::AppState;

/// Report the connected client's session, if any.
pub async fn status(State(state): State<AppState>) -> Json<SessionStatus> {
    let status = state
        .slot
        .active()
        .map_or_else(SessionStatus::disconnected, |session| SessionStatus {
            connected: true,
            session_id: Some(session.id().to_string()),
            state: Some(session.state()),
            delivered: Some(session.delivered()),
        });
    Json(status)
}
