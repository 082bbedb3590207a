use crate::domain::error::DomainError;
use crate::domain::ports::notification_transport::{NotificationPayload, NotificationTransport};
use reqwest::Client;
use serde::Serialize;

/// Posts chat-webhook shaped JSON (`{"text": ...}`) to a URL.
///
/// The recipient is used as the URL when it is one; otherwise the
/// configured default URL receives the message.
pub struct WebhookTransport {
    client: Client,
    default_url: Option<String>,
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    text: String,
    alert_id: &'a str,
    severity: String,
    deal_ids: &'a [String],
    recipient: &'a str,
}

impl WebhookTransport {
    pub fn new(default_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            default_url,
        }
    }

    fn url_for<'a>(&'a self, recipient: &'a str) -> Result<&'a str, DomainError> {
        if recipient.starts_with("http://") || recipient.starts_with("https://") {
            return Ok(recipient);
        }
        self.default_url.as_deref().ok_or_else(|| {
            DomainError::ExternalService(
                "webhook recipient is not a URL and DEALRANK_WEBHOOK_URL is unset".into(),
            )
        })
    }
}

#[async_trait::async_trait]
impl NotificationTransport for WebhookTransport {
    fn channel(&self) -> &str {
        "webhook"
    }

    async fn send(&self, recipient: &str, payload: &NotificationPayload) -> Result<(), DomainError> {
        let url = self.url_for(recipient)?;
        let message = WebhookMessage {
            text: format!(
                "[{}] {}\n{}",
                payload.severity.to_string().to_uppercase(),
                payload.title,
                payload.body
            ),
            alert_id: &payload.alert_id,
            severity: payload.severity.to_string(),
            deal_ids: &payload.deal_ids,
            recipient,
        };

        let resp = self
            .client
            .post(url)
            .header("Idempotency-Key", &payload.idempotency_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| DomainError::ExternalService(format!("Webhook error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::ExternalService(format!("Webhook {status}: {body}")));
        }
        Ok(())
    }
}
