use crate::config::SmtpConfig;
use crate::domain::error::DomainError;
use crate::domain::ports::notification_transport::{NotificationPayload, NotificationTransport};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Sends alerts as plain-text mail over SMTP with STARTTLS. The recipient is
/// the destination address.
pub struct EmailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, DomainError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| DomainError::Parse(format!("DEALRANK_SMTP_FROM={}: {e}", config.from)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| DomainError::Parse(format!("DEALRANK_SMTP_HOST={}: {e}", config.host)))?
            .port(config.port);
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

/// Builds the mail for one alert. The Message-ID is derived from the alert
/// and channel so a re-sent alert carries the same id.
fn compose(from: &Mailbox, recipient: &str, payload: &NotificationPayload) -> Result<Message, DomainError> {
    let to: Mailbox = recipient
        .parse()
        .map_err(|e| DomainError::validation("recipient", format!("invalid email address '{recipient}': {e}")))?;

    let mut body = format!("{}\n\nSeverity: {}\n", payload.body, payload.severity);
    if !payload.deal_ids.is_empty() {
        body.push_str(&format!("Deals: {}\n", payload.deal_ids.join(", ")));
    }
    body.push_str(&format!("Reference: {}\n", payload.idempotency_key));

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(format!(
            "[{}] {}",
            payload.severity.to_string().to_uppercase(),
            payload.title
        ))
        .message_id(Some(format!("<{}.email@dealrank>", payload.alert_id)))
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| DomainError::ExternalService(format!("Email build error: {e}")))
}

#[async_trait::async_trait]
impl NotificationTransport for EmailTransport {
    fn channel(&self) -> &str {
        "email"
    }

    async fn send(&self, recipient: &str, payload: &NotificationPayload) -> Result<(), DomainError> {
        let message = compose(&self.from, recipient, payload)?;
        self.mailer
            .send(message)
            .await
            .map_err(|e| DomainError::ExternalService(format!("SMTP error: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::values::severity::Severity;

    fn payload() -> NotificationPayload {
        NotificationPayload {
            idempotency_key: "alert-1:email".into(),
            alert_id: "alert-1".into(),
            title: "Ledgerly reached strong-consider".into(),
            body: "Deal \"Ledgerly\" scored 85.".into(),
            severity: Severity::High,
            deal_ids: vec!["deal-1".into()],
        }
    }

    fn sender() -> Mailbox {
        "DealRank <alerts@fund.example>".parse().unwrap()
    }

    #[test]
    fn test_compose_carries_alert_fields() {
        let message = compose(&sender(), "partner@fund.example", &payload()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: [HIGH] Ledgerly reached strong-consider"));
        assert!(raw.contains("To: partner@fund.example"));
        assert!(raw.contains("Message-ID: <alert-1.email@dealrank>"));
        assert!(raw.contains("Deals: deal-1"));
        assert!(raw.contains("Reference: alert-1:email"));
    }

    #[test]
    fn test_bad_address_is_validation_error() {
        let err = compose(&sender(), "#deals", &payload()).unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }
}
