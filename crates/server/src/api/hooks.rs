//! Host-platform hook intake.
//!
//! The host posts one JSON event per fired hook. The response carries no
//! information about what happened to it: unknown event kinds, malformed
//! payloads, and suppressed repeats all get the same 202 as a dispatched
//! event, because notification handling must never fail the host request.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;

use chime_core::NotificationEvent;

use crate::state::AppState;

pub async fn hook_event(State(state): State<Arc<AppState>>, body: String) -> StatusCode {
    let event: NotificationEvent = match serde_json::from_str(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(error = %e, "unparseable hook event, ignored");
            return StatusCode::ACCEPTED;
        }
    };

    state.service.handle(&event).await;
    StatusCode::ACCEPTED
}
