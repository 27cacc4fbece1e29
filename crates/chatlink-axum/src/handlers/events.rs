//! SSE events handler - the client's push stream.

use axum::extract::State;
use axum::response::Response;

use crate::state::AppState;

/// SSE events stream endpoint.
///
/// Accepts the caller as the connected client, replacing any previous one.
/// The response head is returned once the session loop has committed it;
/// the body then carries queued events until the session stops, ending
/// with the close frame.
pub async fn stream(State(state): State<AppState>) -> Response {
    let (_session, pending) = state.slot.connect();
    pending.into_response().await
}
