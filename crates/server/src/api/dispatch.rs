//! Internal deferred-dispatch endpoint.
//!
//! This endpoint is reachable by anyone who guesses the request shape, so
//! every outcome — valid redemption, replay, forgery, junk — answers with
//! the same empty 204. The token check is the only gate.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;

use chime_dispatch::DeferredRequest;

use crate::state::AppState;

pub async fn internal_dispatch(State(state): State<Arc<AppState>>, body: String) -> StatusCode {
    let request: DeferredRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(_) => return StatusCode::NO_CONTENT,
    };

    let message = match state.dispatcher.receive_and_verify(request) {
        Some(message) => message,
        None => return StatusCode::NO_CONTENT,
    };

    // This is the deferred request cycle: blocking on the Slack round-trip
    // here is the point of the whole mechanism.
    let settings = state.settings.get().await;
    state.slack.deliver(&message, &settings.webhook_url).await;
    StatusCode::NO_CONTENT
}
