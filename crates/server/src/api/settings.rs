//! Operator settings endpoints.
//!
//! GET never echoes the webhook URL back (it embeds a Slack secret);
//! it only reports whether one is configured.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use chime_core::Settings;
use chime_notify::DeliveryOutcome;

use crate::state::AppState;

#[derive(Serialize)]
pub struct SettingsView {
    pub webhook_configured: bool,
    pub channel: String,
}

impl From<Settings> for SettingsView {
    fn from(settings: Settings) -> Self {
        Self {
            webhook_configured: settings.is_configured(),
            channel: settings.channel,
        }
    }
}

pub async fn settings_get(State(state): State<Arc<AppState>>) -> Json<SettingsView> {
    Json(state.settings.get().await.into())
}

#[derive(Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub channel: String,
}

pub async fn settings_update(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsView>, (StatusCode, String)> {
    let saved = state
        .settings
        .update(Settings {
            webhook_url: update.webhook_url,
            channel: update.channel,
        })
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(saved.into()))
}

#[derive(Serialize)]
pub struct TestOutcome {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Send a sample message so the operator can verify a freshly saved webhook.
pub async fn settings_test(State(state): State<Arc<AppState>>) -> Json<TestOutcome> {
    let settings = state.settings.get().await;
    let outcome = state
        .slack
        .test(&settings.webhook_url, &settings.channel)
        .await;
    Json(match outcome {
        DeliveryOutcome::Delivered => TestOutcome {
            outcome: "delivered",
            detail: None,
        },
        DeliveryOutcome::NotConfigured => TestOutcome {
            outcome: "not_configured",
            detail: None,
        },
        DeliveryOutcome::Failed(reason) => TestOutcome {
            outcome: "failed",
            detail: Some(reason),
        },
    })
}
