//! Slack incoming-webhook delivery client.
//!
//! One POST per message, fixed timeout and redirect policy, no retries.
//! Failures are logged and reported as an outcome, never raised — delivery
//! is best-effort from the perspective of the whole system.

use std::time::Duration;

use crate::traits::{DeliveryOutcome, NotifyError, SlackMessage};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 5;

/// Posts formatted messages to a Slack incoming webhook.
pub struct SlackClient {
    client: reqwest::Client,
}

impl SlackClient {
    pub fn new() -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }

    /// Deliver one message to the webhook.
    ///
    /// An empty `webhook_url` short-circuits without any network call —
    /// the expected state for environments that haven't opted in.
    pub async fn deliver(&self, message: &SlackMessage, webhook_url: &str) -> DeliveryOutcome {
        if webhook_url.is_empty() {
            tracing::debug!("slack webhook not configured, skipping delivery");
            return DeliveryOutcome::NotConfigured;
        }

        let start = std::time::Instant::now();
        let result = self.client.post(webhook_url).json(message).send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!(
                    channel = %message.channel,
                    duration_ms,
                    "slack notification delivered"
                );
                DeliveryOutcome::Delivered
            }
            Ok(response) => {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<unreadable body>".to_string());
                tracing::warn!(
                    channel = %message.channel,
                    %status,
                    body = %body,
                    duration_ms,
                    "slack webhook returned non-2xx status"
                );
                DeliveryOutcome::Failed(format!("webhook returned {status}: {body}"))
            }
            Err(e) => {
                tracing::warn!(
                    channel = %message.channel,
                    error = %e,
                    duration_ms,
                    "slack delivery failed"
                );
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }

    /// Send a sample message so an operator can verify a freshly saved
    /// webhook from the settings page.
    pub async fn test(&self, webhook_url: &str, channel: &str) -> DeliveryOutcome {
        let message = SlackMessage {
            channel: channel.to_string(),
            text: "Test notification from chime — your webhook is wired up.".to_string(),
            username: String::new(),
            icon_emoji: String::new(),
        };
        self.deliver(&message, webhook_url).await
    }
}
