//! Host-platform lookup adapters.
//!
//! The host owns user records, IP geodata, and the rolling action log;
//! these adapters read them over the host's internal HTTP API. Every
//! failure degrades to "nothing found" — a broken host API must only ever
//! cost us notifications, never surface errors.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use chime_core::UserId;
use chime_notify::{ActionLog, GeoLookup, NotifyError, UserDirectory, UserRecord};

/// Reads user, location, and action-log data from the host's internal API.
pub struct HostApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl HostApiClient {
    pub fn new(base_url: &str) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Deserialize)]
struct UserResponse {
    id: UserId,
    #[serde(default)]
    login: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

#[derive(Deserialize)]
struct LocationResponse {
    #[serde(default)]
    location: String,
}

#[derive(Deserialize)]
struct CountResponse {
    #[serde(default)]
    count: usize,
}

#[async_trait]
impl UserDirectory for HostApiClient {
    async fn user(&self, id: UserId) -> Option<UserRecord> {
        let url = format!("{}/users/{}", self.base_url, id);
        let response = match self.client.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!(user_id = id, status = %r.status(), "user lookup missed");
                return None;
            }
            Err(e) => {
                tracing::debug!(user_id = id, error = %e, "user lookup failed");
                return None;
            }
        };
        let user: UserResponse = response.json().await.ok()?;
        Some(UserRecord {
            id: user.id,
            login: user.login,
            first_name: user.first_name,
            last_name: user.last_name,
        })
    }
}

#[async_trait]
impl GeoLookup for HostApiClient {
    async fn location(&self, id: UserId) -> String {
        let url = format!("{}/users/{}/location", self.base_url, id);
        match self.client.get(&url).send().await {
            Ok(r) if r.status().is_success() => r
                .json::<LocationResponse>()
                .await
                .map(|l| l.location)
                .unwrap_or_default(),
            _ => String::new(),
        }
    }
}

#[async_trait]
impl ActionLog for HostApiClient {
    async fn count_since(
        &self,
        user_id: UserId,
        group_key: Option<&str>,
        action: &str,
        since: DateTime<Utc>,
    ) -> usize {
        // Query-encoded via the builder: group keys are host-supplied and
        // may contain `&`/`=`/spaces. `since` travels as Unix seconds.
        let mut request = self
            .client
            .get(format!("{}/actions/count", self.base_url))
            .query(&[
                ("user_id", user_id.to_string()),
                ("action", action.to_string()),
                ("since", since.timestamp().to_string()),
            ]);
        if let Some(key) = group_key {
            request = request.query(&[("group_key", key)]);
        }
        match request.send().await {
            Ok(r) if r.status().is_success() => r
                .json::<CountResponse>()
                .await
                .map(|c| c.count)
                .unwrap_or(0),
            _ => 0,
        }
    }
}

/// Stand-in when no host API is configured: every lookup comes back empty,
/// so every event skips at the formatter.
pub struct DisabledHost;

#[async_trait]
impl UserDirectory for DisabledHost {
    async fn user(&self, _id: UserId) -> Option<UserRecord> {
        None
    }
}

#[async_trait]
impl GeoLookup for DisabledHost {
    async fn location(&self, _id: UserId) -> String {
        String::new()
    }
}

#[async_trait]
impl ActionLog for DisabledHost {
    async fn count_since(
        &self,
        _user_id: UserId,
        _group_key: Option<&str>,
        _action: &str,
        _since: DateTime<Utc>,
    ) -> usize {
        0
    }
}
