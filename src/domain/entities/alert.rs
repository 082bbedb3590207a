use crate::domain::values::alert_type::{AlertStatus, AlertType};
use crate::domain::values::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub investor_id: String,
    pub alert_type: AlertType,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: AlertStatus,
    pub deal_ids: Vec<String>,
    pub portfolio_ids: Vec<String>,
    /// Name of the trigger rule that produced this alert.
    pub rule: String,
    pub action_required: bool,
    pub triggered_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Alert {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        investor_id: String,
        alert_type: AlertType,
        severity: Severity,
        title: String,
        description: String,
        deal_ids: Vec<String>,
        portfolio_ids: Vec<String>,
        rule: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            investor_id,
            alert_type,
            title,
            description,
            severity,
            status: AlertStatus::Unread,
            deal_ids,
            portfolio_ids,
            rule,
            action_required: severity >= Severity::High,
            triggered_at: Utc::now(),
            read_at: None,
            expires_at: None,
        }
    }

    /// Entity used for deduplication: first deal, else first portfolio.
    /// Alerts tied to neither are keyed by their case-folded title, so
    /// unrelated signals of one type do not suppress each other.
    pub fn primary_entity(&self) -> String {
        match self.deal_ids.first().or_else(|| self.portfolio_ids.first()) {
            Some(id) => id.clone(),
            None => format!("title:{}", self.title.trim().to_lowercase()),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(title: &str, deal_ids: Vec<String>, portfolio_ids: Vec<String>) -> Alert {
        Alert::new(
            "inv-1".into(),
            AlertType::MarketShift,
            Severity::Medium,
            title.into(),
            String::new(),
            deal_ids,
            portfolio_ids,
            "anomaly_market_shift".into(),
        )
    }

    #[test]
    fn test_primary_entity_prefers_deal_then_portfolio() {
        let a = alert("x", vec!["d-1".into(), "d-2".into()], vec!["p-1".into()]);
        assert_eq!(a.primary_entity(), "d-1");
        let b = alert("x", vec![], vec!["p-1".into()]);
        assert_eq!(b.primary_entity(), "p-1");
    }

    #[test]
    fn test_entityless_alerts_keyed_by_title() {
        let a = alert("Rates up 50bp", vec![], vec![]);
        let b = alert("  rates UP 50bp ", vec![], vec![]);
        let c = alert("Chip export ban", vec![], vec![]);
        assert_eq!(a.primary_entity(), "title:rates up 50bp");
        assert_eq!(a.primary_entity(), b.primary_entity());
        assert_ne!(a.primary_entity(), c.primary_entity());
    }
}
