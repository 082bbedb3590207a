use crate::domain::error::DomainError;
use crate::domain::ports::notification_transport::{NotificationPayload, NotificationTransport};
use tracing::info;

/// Writes the notification as a structured log line. Stands in for the
/// in-app inbox, which reads alerts from storage directly.
pub struct LogTransport;

#[async_trait::async_trait]
impl NotificationTransport for LogTransport {
    fn channel(&self) -> &str {
        "log"
    }

    async fn send(&self, recipient: &str, payload: &NotificationPayload) -> Result<(), DomainError> {
        info!(
            recipient,
            alert_id = %payload.alert_id,
            idempotency_key = %payload.idempotency_key,
            severity = %payload.severity,
            title = %payload.title,
            "notification"
        );
        Ok(())
    }
}
