//! Notification delivery.

use async_trait::async_trait;

use super::AlertPayload;

/// Fire-and-forget delivery capability for rendered alerts.
///
/// Implementations must never surface delivery failures to the caller;
/// the monitoring engine does not retry or queue alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, payload: &AlertPayload);
}

/// Posts alerts as JSON to a configured webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, payload: &AlertPayload) {
        match self.client.post(&self.url).json(payload).send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(
                    "Alert webhook returned {} | {}",
                    response.status(),
                    payload.service
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Alert delivery failed | {} | {}", payload.service, e);
            }
        }
    }
}

/// Test double that records every payload it is handed.
#[cfg(test)]
pub struct RecordingNotifier {
    sent: std::sync::Mutex<Vec<AlertPayload>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<AlertPayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, payload: &AlertPayload) {
        self.sent.lock().unwrap().push(payload.clone());
    }
}

#[cfg(test)]
mod tests {
    use crate::alert::{AlertKind, AlertPayload};

    #[test]
    fn test_payload_serializes_for_webhook_body() {
        let payload = AlertPayload {
            kind: AlertKind::Down,
            service: "Main Website".to_string(),
            url: "https://example.com".to_string(),
            consecutive_failures: 3,
            message: "down".to_string(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "DOWN");
        assert_eq!(json["service"], "Main Website");
        assert_eq!(json["consecutive_failures"], 3);
    }
}
