use super::{lock, parse_enum, parse_json, parse_opt_ts, parse_ts, ts, SharedConnection};
use crate::domain::entities::alert::Alert;
use crate::domain::error::DomainError;
use crate::domain::ports::alert_repository::{AlertFilter, AlertRepository, InsertOutcome};
use crate::domain::values::alert_type::AlertStatus;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

const ALERT_COLUMNS: &str = "id, investor_id, alert_type, title, description, severity, status, deal_ids, portfolio_ids, rule, action_required, triggered_at, read_at, expires_at";

pub struct SqliteAlertRepo {
    conn: SharedConnection,
}

impl SqliteAlertRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_alert(row: &rusqlite::Row) -> Result<Alert, rusqlite::Error> {
        let alert_type: String = row.get(2)?;
        let severity: String = row.get(5)?;
        let status: String = row.get(6)?;
        let deal_ids: String = row.get(7)?;
        let portfolio_ids: String = row.get(8)?;
        let triggered: String = row.get(11)?;

        Ok(Alert {
            id: row.get(0)?,
            investor_id: row.get(1)?,
            alert_type: parse_enum(2, &alert_type)?,
            title: row.get(3)?,
            description: row.get(4)?,
            severity: parse_enum(5, &severity)?,
            status: parse_enum(6, &status)?,
            deal_ids: parse_json(7, &deal_ids)?,
            portfolio_ids: parse_json(8, &portfolio_ids)?,
            rule: row.get(9)?,
            action_required: row.get(10)?,
            triggered_at: parse_ts(11, &triggered)?,
            read_at: parse_opt_ts(12, row.get(12)?)?,
            expires_at: parse_opt_ts(13, row.get(13)?)?,
        })
    }
}

impl AlertRepository for SqliteAlertRepo {
    fn insert_unless_duplicate(
        &self,
        alert: &Alert,
        since: DateTime<Utc>,
    ) -> Result<InsertOutcome, DomainError> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        let primary = alert.primary_entity();

        let existing: Option<String> = tx
            .query_row(
                "SELECT id FROM alerts
                 WHERE investor_id = ?1 AND alert_type = ?2 AND primary_entity = ?3
                   AND status = 'unread' AND triggered_at >= ?4
                 ORDER BY triggered_at DESC LIMIT 1",
                params![
                    alert.investor_id,
                    alert.alert_type.to_string(),
                    primary,
                    ts(&since)
                ],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(existing_id) = existing {
            return Ok(InsertOutcome::Duplicate { existing_id });
        }

        tx.execute(
            &format!(
                "INSERT INTO alerts ({ALERT_COLUMNS}, primary_entity)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ),
            params![
                alert.id,
                alert.investor_id,
                alert.alert_type.to_string(),
                alert.title,
                alert.description,
                alert.severity.to_string(),
                alert.status.to_string(),
                serde_json::to_string(&alert.deal_ids)?,
                serde_json::to_string(&alert.portfolio_ids)?,
                alert.rule,
                alert.action_required,
                ts(&alert.triggered_at),
                alert.read_at.as_ref().map(ts),
                alert.expires_at.as_ref().map(ts),
                primary,
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to insert alert: {e}")))?;
        tx.commit()?;
        Ok(InsertOutcome::Inserted)
    }

    fn get(&self, id: &str) -> Result<Option<Alert>, DomainError> {
        let conn = lock(&self.conn)?;
        let alert = conn
            .query_row(
                &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"),
                params![id],
                Self::row_to_alert,
            )
            .optional()?;
        Ok(alert)
    }

    fn set_status(
        &self,
        id: &str,
        status: AlertStatus,
        read_at: Option<DateTime<Utc>>,
    ) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        let rows = conn
            .execute(
                "UPDATE alerts SET status = ?1, read_at = ?2 WHERE id = ?3",
                params![status.to_string(), read_at.as_ref().map(ts), id],
            )
            .map_err(|e| DomainError::Database(format!("Failed to update alert: {e}")))?;
        if rows == 0 {
            return Err(DomainError::NotFound(format!("Alert not found: {id}")));
        }
        Ok(())
    }

    fn list(
        &self,
        investor_id: &str,
        filter: &AlertFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Alert>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut sql = format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE investor_id = ?1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> =
            vec![Box::new(investor_id.to_string())];

        if let Some(alert_type) = filter.alert_type {
            sql.push_str(&format!(" AND alert_type = ?{}", param_values.len() + 1));
            param_values.push(Box::new(alert_type.to_string()));
        }
        if let Some(status) = filter.status {
            sql.push_str(&format!(" AND status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.to_string()));
        }
        if !filter.include_expired {
            sql.push_str(&format!(
                " AND (expires_at IS NULL OR expires_at > ?{})",
                param_values.len() + 1
            ));
            param_values.push(Box::new(ts(&now)));
        }
        sql.push_str(" ORDER BY triggered_at DESC, rowid DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT ?{}", param_values.len() + 1));
            param_values.push(Box::new(limit as i64));
        }

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let alerts = stmt
            .query_map(params_refs.as_slice(), Self::row_to_alert)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(alerts)
    }

    fn archive_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let conn = lock(&self.conn)?;
        let rows = conn
            .execute(
                "UPDATE alerts SET status = 'archived'
                 WHERE status != 'archived' AND expires_at IS NOT NULL AND expires_at <= ?1",
                params![ts(&now)],
            )
            .map_err(|e| DomainError::Database(format!("Failed to archive alerts: {e}")))?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::values::alert_type::AlertType;
    use crate::domain::values::severity::Severity;
    use crate::infrastructure::sqlite::open;
    use chrono::Duration;

    fn alert(investor: &str, deal: &str) -> Alert {
        Alert::new(
            investor.into(),
            AlertType::DealOpportunity,
            Severity::High,
            "Deal reached strong-consider".into(),
            "Scored 85".into(),
            vec![deal.into()],
            vec![],
            "strong_consider_reached".into(),
        )
    }

    #[test]
    fn test_duplicate_inside_window_is_suppressed() {
        let repo = SqliteAlertRepo::new(open(":memory:").unwrap());
        let since = Utc::now() - Duration::hours(24);
        let first = alert("inv-1", "deal-1");
        assert!(matches!(
            repo.insert_unless_duplicate(&first, since).unwrap(),
            InsertOutcome::Inserted
        ));
        match repo.insert_unless_duplicate(&alert("inv-1", "deal-1"), since).unwrap() {
            InsertOutcome::Duplicate { existing_id } => assert_eq!(existing_id, first.id),
            other => panic!("expected duplicate, got {other:?}"),
        }
        // different primary entity is not a duplicate
        assert!(matches!(
            repo.insert_unless_duplicate(&alert("inv-1", "deal-2"), since).unwrap(),
            InsertOutcome::Inserted
        ));
    }

    #[test]
    fn test_read_alert_no_longer_suppresses() {
        let repo = SqliteAlertRepo::new(open(":memory:").unwrap());
        let since = Utc::now() - Duration::hours(24);
        let first = alert("inv-1", "deal-1");
        repo.insert_unless_duplicate(&first, since).unwrap();
        repo.set_status(&first.id, AlertStatus::Read, Some(Utc::now()))
            .unwrap();
        assert!(matches!(
            repo.insert_unless_duplicate(&alert("inv-1", "deal-1"), since).unwrap(),
            InsertOutcome::Inserted
        ));
    }

    #[test]
    fn test_expired_hidden_then_archived() {
        let repo = SqliteAlertRepo::new(open(":memory:").unwrap());
        let now = Utc::now();
        let mut old = alert("inv-1", "deal-1");
        old.expires_at = Some(now - Duration::hours(1));
        repo.insert_unless_duplicate(&old, now - Duration::hours(24))
            .unwrap();

        assert!(repo.list("inv-1", &AlertFilter::default(), now).unwrap().is_empty());
        let all = AlertFilter {
            include_expired: true,
            ..Default::default()
        };
        assert_eq!(repo.list("inv-1", &all, now).unwrap().len(), 1);

        assert_eq!(repo.archive_expired(now).unwrap(), 1);
        assert_eq!(repo.archive_expired(now).unwrap(), 0);
        let stored = repo.get(&old.id).unwrap().unwrap();
        assert_eq!(stored.status, AlertStatus::Archived);
    }
}
