use crate::domain::entities::alert::Alert;
use crate::domain::error::DomainError;
use crate::domain::values::alert_type::{AlertStatus, AlertType};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Inserted,
    /// An unread alert with the same dedup key already exists.
    Duplicate { existing_id: String },
}

#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub alert_type: Option<AlertType>,
    pub status: Option<AlertStatus>,
    pub include_expired: bool,
    pub limit: Option<usize>,
}

pub trait AlertRepository: Send + Sync {
    /// Inserts `alert` unless an unread alert for the same investor, type and
    /// primary entity was triggered at or after `since`. Check and insert are
    /// one atomic step.
    fn insert_unless_duplicate(
        &self,
        alert: &Alert,
        since: DateTime<Utc>,
    ) -> Result<InsertOutcome, DomainError>;
    fn get(&self, id: &str) -> Result<Option<Alert>, DomainError>;
    fn set_status(
        &self,
        id: &str,
        status: AlertStatus,
        read_at: Option<DateTime<Utc>>,
    ) -> Result<(), DomainError>;
    /// Newest first.
    fn list(
        &self,
        investor_id: &str,
        filter: &AlertFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Alert>, DomainError>;
    /// Archives every non-archived alert whose expiry has passed.
    fn archive_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;
}
