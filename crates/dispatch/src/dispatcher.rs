//! The deferred dispatcher: loopback launch and token redemption.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use chime_notify::{Dispatch, NotifyError, SlackMessage};

use crate::token::TokenIssuer;

/// Marker distinguishing deferred dispatch requests from any other POST
/// that reaches the endpoint.
pub const DISPATCH_ACTION: &str = "chime.dispatch";

/// The delivery side blocks on the Slack round-trip (30 s budget) before
/// answering the loopback request; closing the connection earlier would
/// cancel that delivery mid-flight, so this must comfortably outlast it.
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(40);

/// Body of the self-addressed dispatch request. Everything the delivery
/// side needs travels here — no in-memory state survives between launch
/// and redemption, since the two requests may be handled by different
/// worker processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferredRequest {
    pub action: String,
    pub nonce: String,
    pub payload: SlackMessage,
}

/// Fire-and-forget dispatcher posting to the process's own dispatch
/// endpoint.
pub struct DeferredDispatcher {
    client: reqwest::Client,
    issuer: Arc<TokenIssuer>,
    endpoint: String,
}

impl DeferredDispatcher {
    /// `loopback_url` is the base URL of this deployment (bind address or
    /// the configured public URL when behind a load balancer).
    pub fn new(issuer: Arc<TokenIssuer>, loopback_url: &str) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(LAUNCH_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            issuer,
            endpoint: format!("{}/internal/dispatch", loopback_url.trim_end_matches('/')),
        })
    }

    /// Validate an arriving deferred request and unwrap its payload.
    ///
    /// Returns `None` for anything without a valid, unexpired, unredeemed
    /// token bound to this payload. The endpoint is reachable by any
    /// caller who guesses the request shape, so a refusal is a silent
    /// no-op, not an error.
    pub fn receive_and_verify(&self, request: DeferredRequest) -> Option<SlackMessage> {
        if request.action != DISPATCH_ACTION {
            tracing::debug!(action = %request.action, "unknown dispatch action, ignored");
            return None;
        }

        let payload_bytes = match serde_json::to_vec(&request.payload) {
            Ok(bytes) => bytes,
            Err(_) => return None,
        };

        if !self.issuer.redeem(&request.nonce, &payload_bytes) {
            tracing::debug!("dispatch token refused");
            return None;
        }

        Some(request.payload)
    }
}

#[async_trait]
impl Dispatch for DeferredDispatcher {
    /// Issue a token for the message and post the loopback request without
    /// waiting for it. Called inline in the triggering request; the only
    /// cost there is serializing the body and spawning the send.
    async fn launch(&self, message: SlackMessage) {
        let payload_bytes = match serde_json::to_vec(&message) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "deferred payload failed to serialize, dropped");
                return;
            }
        };
        let nonce = self.issuer.issue(&payload_bytes);
        let body = DeferredRequest {
            action: DISPATCH_ACTION.to_string(),
            nonce,
            payload: message,
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            match client.post(&endpoint).json(&body).send().await {
                Ok(_) => {}
                Err(e) => {
                    // Best-effort: the notification is simply lost.
                    tracing::debug!(error = %e, "loopback dispatch request failed");
                }
            }
        });
    }
}
