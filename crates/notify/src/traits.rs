//! Collaborator traits and shared delivery types.
//!
//! The host platform owns user records, IP geodata, and the rolling action
//! log; this crate only reads them through these seams. The `Dispatch` seam
//! decouples formatting from the delivery mechanism so the service never
//! blocks on the Slack round-trip.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chime_core::UserId;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A formatted message ready for the Slack incoming webhook.
///
/// Serialized as-is into the webhook's JSON body. Empty `username` and
/// `icon_emoji` let the webhook's own configured identity apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackMessage {
    pub channel: String,
    pub text: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub icon_emoji: String,
}

/// Outcome of one delivery attempt. Never retried, never surfaced to the
/// triggering feature.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Webhook URL unset — the expected state for environments that
    /// haven't opted in.
    NotConfigured,
    Failed(String),
}

/// User record as the host platform stores it.
#[derive(Debug, Clone, Default)]
pub struct UserRecord {
    pub id: UserId,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
}

/// Read access to the host's user table.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch a user record; `None` when no such user exists.
    async fn user(&self, id: UserId) -> Option<UserRecord>;
}

/// Human-readable location derived from a user's stored raw IP geodata.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Location string like "Texas, USA". Empty when nothing is on file
    /// or the geocoder is absent.
    async fn location(&self, id: UserId) -> String;
}

/// Read-only view of the host's rolling action log.
#[async_trait]
pub trait ActionLog: Send + Sync {
    /// Count records for the tuple logged at or after `since`, excluding
    /// the action currently being handled.
    async fn count_since(
        &self,
        user_id: UserId,
        group_key: Option<&str>,
        action: &str,
        since: DateTime<Utc>,
    ) -> usize;
}

/// Hand-off seam between formatting and delivery.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Schedule a message for asynchronous delivery and return without
    /// waiting for the Slack round-trip.
    async fn launch(&self, message: SlackMessage);
}
