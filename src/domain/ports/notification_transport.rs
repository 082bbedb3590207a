use crate::domain::entities::alert::Alert;
use crate::domain::error::DomainError;
use crate::domain::values::severity::Severity;
use async_trait::async_trait;
use serde::Serialize;

/// What a transport delivers for one alert.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPayload {
    /// `alert_id:channel`, stable across re-dispatches.
    pub idempotency_key: String,
    pub alert_id: String,
    pub title: String,
    pub body: String,
    pub severity: Severity,
    pub deal_ids: Vec<String>,
}

impl NotificationPayload {
    pub fn from_alert(alert: &Alert, channel: &str) -> Self {
        Self {
            idempotency_key: format!("{}:{}", alert.id, channel),
            alert_id: alert.id.clone(),
            title: alert.title.clone(),
            body: alert.description.clone(),
            severity: alert.severity,
            deal_ids: alert.deal_ids.clone(),
        }
    }
}

/// One delivery channel. All channels are driven through this interface.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Channel name callers address, e.g. "webhook".
    fn channel(&self) -> &str;

    async fn send(&self, recipient: &str, payload: &NotificationPayload) -> Result<(), DomainError>;
}
