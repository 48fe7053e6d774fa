//! Runtime Slack settings: webhook URL and target channel.
//!
//! Read on every delivery attempt, mutated only through the admin settings
//! action. Persisted as a JSON file under the data dir so a restart keeps
//! the operator's configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::ChimeError;

fn default_channel() -> String {
    "activity".to_string()
}

/// Operator-facing notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Slack incoming-webhook URL. Empty means notifications are opted out.
    #[serde(default)]
    pub webhook_url: String,
    /// Channel messages are posted to unless a rule picks another.
    #[serde(default = "default_channel")]
    pub channel: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            channel: default_channel(),
        }
    }
}

impl Settings {
    pub fn is_configured(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    /// Whitespace-trimmed copy. No URL validation beyond this — a malformed
    /// URL fails at delivery time, not save time.
    pub fn normalized(&self) -> Self {
        let channel = self.channel.trim();
        Self {
            webhook_url: self.webhook_url.trim().to_string(),
            channel: if channel.is_empty() {
                default_channel()
            } else {
                channel.to_string()
            },
        }
    }
}

/// Thread-safe settings store backed by a JSON file.
pub struct SettingsStore {
    path: PathBuf,
    inner: RwLock<Settings>,
}

impl SettingsStore {
    /// Open the store, loading persisted settings when the file exists.
    pub fn load(data_dir: &Path) -> Result<Self, ChimeError> {
        let path = data_dir.join("slack-settings.json");
        let settings = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str::<Settings>(&raw)
                .map_err(|e| ChimeError::Settings(format!("invalid settings file: {e}")))?
                .normalized()
        } else {
            Settings::default()
        };
        Ok(Self {
            path,
            inner: RwLock::new(settings),
        })
    }

    /// Current settings snapshot. Eventual consistency is fine here: a
    /// delivery racing a settings update may use the old values.
    pub async fn get(&self) -> Settings {
        self.inner.read().await.clone()
    }

    /// Replace settings and persist them.
    ///
    /// The write lock is held across the file write so concurrent updates
    /// can't leave the persisted file and the in-memory snapshot disagreeing.
    pub async fn update(&self, settings: Settings) -> Result<Settings, ChimeError> {
        let settings = settings.normalized();
        let mut guard = self.inner.write().await;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&settings)
            .map_err(|e| ChimeError::Serialize(e.to_string()))?;
        std::fs::write(&self.path, raw)?;

        *guard = settings.clone();
        tracing::info!(
            channel = %settings.channel,
            configured = settings.is_configured(),
            "slack settings updated"
        );
        Ok(settings)
    }
}
