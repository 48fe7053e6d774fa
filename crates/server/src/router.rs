//! HTTP router construction.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api;
use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, cors_origin: &str) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/hooks/event", post(api::hook_event))
        .route("/internal/dispatch", post(api::internal_dispatch))
        .route(
            "/admin/settings",
            get(api::settings_get).post(api::settings_update),
        )
        .route("/admin/settings/test", post(api::settings_test))
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

/// CORS from the configured origin; `*` (the default) or an unparseable
/// value means permissive.
fn cors_layer(origin: &str) -> CorsLayer {
    match origin.parse::<HeaderValue>() {
        Ok(value) if origin != "*" => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        _ => CorsLayer::permissive(),
    }
}
