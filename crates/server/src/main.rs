//! chime-server — event-to-Slack notification bridge.
//!
//! Listens for host-platform activity events, formats a short message per
//! event, and delivers it to a Slack channel via an incoming webhook,
//! deferring the Slack round-trip to a token-authenticated loopback
//! request so the triggering request is never slowed down.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use chime_core::{Config, SettingsStore};
use chime_dispatch::{DeferredDispatcher, TokenIssuer};
use chime_notify::{
    ActionLog, DuplicateSuppressor, GeoLookup, NotificationService, SlackClient, UserDirectory,
};
use chime_server::{build_router, AppState};

/// Event-to-Slack notification bridge for the community platform.
#[derive(Parser, Debug)]
#[command(name = "chime-server", version, about)]
struct Cli {
    /// Bind port override (falls back to the PORT env var).
    #[arg(long)]
    port: Option<u16>,

    /// Data directory override (falls back to the DATA_DIR env var).
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    chime_core::config::load_dotenv();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }
    config.log_summary();

    let settings = Arc::new(SettingsStore::load(&config.storage.data_dir)?);
    if !settings.get().await.is_configured() {
        info!("no Slack webhook configured yet — deliveries are no-ops until one is saved");
    }

    let key = TokenIssuer::load_or_generate_key(&config.storage.data_dir)?;
    let issuer = Arc::new(TokenIssuer::new(key, config.dispatch.token_ttl_secs));
    let dispatcher = Arc::new(DeferredDispatcher::new(
        issuer,
        &config.server.loopback_url(),
    )?);
    let slack = SlackClient::new()?;

    let (users, geo, actions): (
        Arc<dyn UserDirectory>,
        Arc<dyn GeoLookup>,
        Arc<dyn ActionLog>,
    ) = match &config.host_api.base_url {
        Some(base_url) => {
            let host = Arc::new(chime_server::host::HostApiClient::new(base_url)?);
            (host.clone(), host.clone(), host)
        }
        None => {
            warn!("HOST_API_BASE_URL unset — user lookups disabled, every event will skip");
            let host = Arc::new(chime_server::host::DisabledHost);
            (host.clone(), host.clone(), host)
        }
    };

    let service = NotificationService::new(
        users,
        geo,
        actions,
        settings.clone(),
        dispatcher.clone(),
        DuplicateSuppressor::from_config(&config.suppression),
    );

    let state = Arc::new(AppState {
        service,
        dispatcher,
        slack,
        settings,
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("chime-server listening on http://{}", addr);
    axum::serve(listener, build_router(state, &config.server.cors_origin)).await?;

    Ok(())
}
