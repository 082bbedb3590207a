use crate::domain::entities::alert::Alert;
use crate::domain::error::DomainError;
use crate::domain::ports::alert_repository::{AlertFilter, AlertRepository};
use crate::domain::values::alert_type::AlertStatus;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// Investor-facing alert inbox: listing and status transitions.
pub struct AlertsUseCase {
    repo: Arc<dyn AlertRepository>,
}

impl AlertsUseCase {
    pub fn new(repo: Arc<dyn AlertRepository>) -> Self {
        Self { repo }
    }

    pub fn list(&self, investor_id: &str, filter: &AlertFilter) -> Result<Vec<Alert>, DomainError> {
        self.repo.list(investor_id, filter, Utc::now())
    }

    pub fn get(&self, alert_id: &str) -> Result<Alert, DomainError> {
        self.repo
            .get(alert_id)?
            .ok_or_else(|| DomainError::NotFound(format!("Alert not found: {alert_id}")))
    }

    pub fn mark_read(&self, alert_id: &str, investor_id: &str) -> Result<Alert, DomainError> {
        let mut alert = self.owned(alert_id, investor_id)?;
        if alert.status == AlertStatus::Archived {
            return Err(DomainError::Conflict(format!("alert {alert_id} is archived")));
        }
        if alert.status == AlertStatus::Unread {
            let now = Utc::now();
            self.repo.set_status(alert_id, AlertStatus::Read, Some(now))?;
            alert.status = AlertStatus::Read;
            alert.read_at = Some(now);
        }
        Ok(alert)
    }

    pub fn archive(&self, alert_id: &str, investor_id: &str) -> Result<Alert, DomainError> {
        let mut alert = self.owned(alert_id, investor_id)?;
        if alert.status != AlertStatus::Archived {
            self.repo
                .set_status(alert_id, AlertStatus::Archived, alert.read_at)?;
            alert.status = AlertStatus::Archived;
        }
        Ok(alert)
    }

    /// Moves every alert past its expiry to archived. Nothing is deleted.
    pub fn archive_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let count = self.repo.archive_expired(now)?;
        if count > 0 {
            info!(count, "expired alerts archived");
        }
        Ok(count)
    }

    fn owned(&self, alert_id: &str, investor_id: &str) -> Result<Alert, DomainError> {
        let alert = self.get(alert_id)?;
        if alert.investor_id != investor_id {
            return Err(DomainError::Forbidden(format!(
                "alert {alert_id} belongs to another investor"
            )));
        }
        Ok(alert)
    }
}
