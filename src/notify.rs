//! Forwarding of failure messages to a Slack incoming webhook.

use serde::Serialize;
use tracing::warn;

use crate::errors::ClientError;
use crate::http::{USER_AGENT, ensure_success};
use crate::secrets::SlackSecrets;

const VENDOR: &str = "Slack";

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct SlackNotifier {
    http: reqwest::Client,
    webhook_url: String,
    channel: Option<String>,
}

impl SlackNotifier {
    pub fn new(secrets: &SlackSecrets) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|source| ClientError::Http {
                vendor: VENDOR,
                source,
            })?;
        Ok(Self {
            http,
            webhook_url: secrets.webhook_url.trim().to_string(),
            channel: secrets.channel.clone(),
        })
    }

    /// Post a plain-text message.
    pub async fn post(&self, text: &str) -> Result<(), ClientError> {
        let message = WebhookMessage {
            text,
            channel: self.channel.as_deref(),
        };
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                vendor: VENDOR,
                source,
            })?;
        ensure_success(VENDOR, resp).await
    }

    /// Forward a command failure. Delivery problems are logged and swallowed
    /// so they never replace the original error.
    pub async fn forward_error(&self, command: &str, error: &str) {
        let text = format!("enrollkit {command} failed: {error}");
        if let Err(e) = self.post(&text).await {
            warn!(command, error = %e, "failed to forward error to Slack");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_omits_missing_channel() {
        let msg = WebhookMessage {
            text: "hello",
            channel: None,
        };
        assert_eq!(serde_json::to_string(&msg).unwrap(), r#"{"text":"hello"}"#);
    }

    #[test]
    fn message_includes_channel() {
        let msg = WebhookMessage {
            text: "hi",
            channel: Some("#ops"),
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r##"{"text":"hi","channel":"#ops"}"##
        );
    }

    #[test]
    fn notifier_trims_webhook_url() {
        let notifier = SlackNotifier::new(&SlackSecrets {
            webhook_url: " https://hooks.slack.com/services/x \n".into(),
            channel: None,
        })
        .unwrap();
        assert_eq!(notifier.webhook_url, "https://hooks.slack.com/services/x");
    }
}
