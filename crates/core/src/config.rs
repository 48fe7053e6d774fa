use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub host_api: HostApiConfig,
    pub dispatch: DispatchConfig,
    pub suppression: SuppressionConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            storage: StorageConfig::from_env(),
            host_api: HostApiConfig::from_env(),
            dispatch: DispatchConfig::from_env(),
            suppression: SuppressionConfig::from_env(),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!("  loopback:    {}", self.server.loopback_url());
        tracing::info!("  storage:     data_dir={}", self.storage.data_dir.display());
        tracing::info!(
            "  host api:    {}",
            self.host_api.base_url.as_deref().unwrap_or("(none)")
        );
        tracing::info!("  dispatch:    token_ttl={}s", self.dispatch.token_ttl_secs);
        tracing::info!(
            "  suppression: window={}m, after={}",
            self.suppression.window_mins,
            self.suppression.suppress_after
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// Externally reachable base URL for the deferred loopback call.
    /// Needed when the process sits behind a load balancer; otherwise
    /// the local bind address is used.
    pub public_base_url: Option<String>,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_u16("PORT", 3002),
            cors_origin: env_or("CORS_ORIGIN", "*"),
            public_base_url: env_opt("PUBLIC_BASE_URL"),
        }
    }

    /// Base URL the deferred dispatch request is posted to.
    pub fn loopback_url(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://127.0.0.1:{}", self.port),
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    fn from_env() -> Self {
        Self {
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
        }
    }
}

// ── Host platform API ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostApiConfig {
    /// Base URL of the host platform's internal API, used for user,
    /// location, and action-log lookups. Unset means lookups come back
    /// empty and every event is skipped.
    pub base_url: Option<String>,
}

impl HostApiConfig {
    fn from_env() -> Self {
        Self {
            base_url: env_opt("HOST_API_BASE_URL"),
        }
    }
}

// ── Deferred dispatch ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// How long an unredeemed dispatch token stays valid.
    pub token_ttl_secs: u64,
}

impl DispatchConfig {
    fn from_env() -> Self {
        Self {
            token_ttl_secs: env_u64("DISPATCH_TOKEN_TTL_SECS", 300),
        }
    }
}

// ── Duplicate suppression ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressionConfig {
    /// Trailing window over the action log, in minutes.
    pub window_mins: i64,
    /// Prior records inside the window before a repeat is suppressed.
    /// 1 means the first occurrence passes and the second is dropped.
    pub suppress_after: usize,
}

impl SuppressionConfig {
    fn from_env() -> Self {
        Self {
            window_mins: env_i64("SUPPRESS_WINDOW_MINS", 30),
            suppress_after: env_usize("SUPPRESS_AFTER", 1),
        }
    }
}
