use crate::error::NotifyError;
use serde_json::{json, Value};
use std::time::Duration;

/// Timeout for a single webhook delivery.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Severity of an alert, rendered as the attachment colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Success,
    Failure,
}

impl AlertLevel {
    pub fn color(&self) -> &'static str {
        match self {
            AlertLevel::Success => "good",
            AlertLevel::Failure => "danger",
        }
    }
}

/// Builds the webhook body for one alert.
///
/// The message carries a single attachment; `link`, when present and
/// non-empty, becomes the attachment's title link.
pub fn build_payload(
    username: &str,
    level: AlertLevel,
    title: &str,
    message: &str,
    link: Option<&str>,
) -> Value {
    let mut attachment = json!({
        "fallback": format!("{title}: {message}"),
        "color": level.color(),
        "title": title,
        "text": message,
    });
    if let Some(link) = link.filter(|l| !l.is_empty()) {
        attachment["title_link"] = Value::String(link.to_string());
    }

    json!({
        "username": username,
        "attachments": [attachment],
    })
}

/// Posts alerts to one incoming webhook.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
    username: String,
}

impl SlackNotifier {
    /// Creates a notifier that posts as `username` to `webhook_url`.
    pub fn new(webhook_url: impl Into<String>, username: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("failed to build webhook client, using defaults: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            webhook_url: webhook_url.into(),
            username: username.into(),
        }
    }

    /// Sends a success alert.
    pub async fn success(
        &self,
        title: &str,
        message: &str,
        link: Option<&str>,
    ) -> Result<(), NotifyError> {
        self.send(AlertLevel::Success, title, message, link).await
    }

    /// Sends a failure alert.
    pub async fn failure(
        &self,
        title: &str,
        message: &str,
        link: Option<&str>,
    ) -> Result<(), NotifyError> {
        self.send(AlertLevel::Failure, title, message, link).await
    }

    /// Posts one alert. No retries.
    ///
    /// # Errors
    ///
    /// - [`NotifyError::Transport`] if the webhook cannot be reached.
    /// - [`NotifyError::Rejected`] if it answers with a non-2xx status.
    pub async fn send(
        &self,
        level: AlertLevel,
        title: &str,
        message: &str,
        link: Option<&str>,
    ) -> Result<(), NotifyError> {
        let payload = build_payload(&self.username, level, title, message, link);
        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), title, "webhook rejected notification");
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(level = ?level, title, "notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_one_coloured_attachment() {
        let payload = build_payload(
            "Employee API",
            AlertLevel::Failure,
            "Health check",
            "database unreachable",
            Some("https://git.example.com/employee-api"),
        );

        assert_eq!(payload["username"], "Employee API");
        let attachments = payload["attachments"].as_array().unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0]["color"], "danger");
        assert_eq!(attachments[0]["title"], "Health check");
        assert_eq!(attachments[0]["text"], "database unreachable");
        assert_eq!(
            attachments[0]["title_link"],
            "https://git.example.com/employee-api"
        );
        assert_eq!(
            attachments[0]["fallback"],
            "Health check: database unreachable"
        );
    }

    #[test]
    fn empty_link_is_omitted() {
        let payload = build_payload("bot", AlertLevel::Success, "t", "m", Some(""));
        assert_eq!(payload["attachments"][0]["color"], "good");
        assert!(payload["attachments"][0].get("title_link").is_none());
    }
}
