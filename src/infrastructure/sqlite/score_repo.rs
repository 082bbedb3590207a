use super::{lock, parse_enum, parse_json, parse_ts, ts, SharedConnection};
use crate::domain::entities::composite_score::CompositeScore;
use crate::domain::error::DomainError;
use crate::domain::ports::score_repository::ScoreRepository;
use rusqlite::{params, OptionalExtension};

const SCORE_COLUMNS: &str = "id, deal_id, investor_id, value, tier, breakdown, missing, weights_used, weights_normalized, computed_at";

/// Append-only. Reads order by `computed_at`, newest first; the insertion
/// sequence only breaks ties between equal timestamps.
pub struct SqliteScoreRepo {
    conn: SharedConnection,
}

impl SqliteScoreRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_score(row: &rusqlite::Row) -> Result<CompositeScore, rusqlite::Error> {
        let tier: String = row.get(4)?;
        let breakdown: String = row.get(5)?;
        let missing: String = row.get(6)?;
        let weights: String = row.get(7)?;
        let computed: String = row.get(9)?;

        Ok(CompositeScore {
            id: row.get(0)?,
            deal_id: row.get(1)?,
            investor_id: row.get(2)?,
            value: row.get(3)?,
            tier: parse_enum(4, &tier)?,
            breakdown: parse_json(5, &breakdown)?,
            missing: parse_json(6, &missing)?,
            weights_used: parse_json(7, &weights)?,
            weights_normalized: row.get(8)?,
            computed_at: parse_ts(9, &computed)?,
        })
    }
}

impl ScoreRepository for SqliteScoreRepo {
    fn append(&self, score: &CompositeScore) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            &format!(
                "INSERT INTO score_history ({SCORE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                score.id,
                score.deal_id,
                score.investor_id,
                score.value,
                score.tier.to_string(),
                serde_json::to_string(&score.breakdown)?,
                serde_json::to_string(&score.missing)?,
                serde_json::to_string(&score.weights_used)?,
                score.weights_normalized,
                ts(&score.computed_at),
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to append score: {e}")))?;
        Ok(())
    }

    fn history(
        &self,
        deal_id: &str,
        investor_id: &str,
        limit: usize,
    ) -> Result<Vec<CompositeScore>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SCORE_COLUMNS} FROM score_history
             WHERE deal_id = ?1 AND investor_id = ?2
             ORDER BY computed_at DESC, seq DESC LIMIT ?3"
        ))?;
        let scores = stmt
            .query_map(params![deal_id, investor_id, limit as i64], Self::row_to_score)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(scores)
    }

    fn latest(&self, deal_id: &str, investor_id: &str) -> Result<Option<CompositeScore>, DomainError> {
        let conn = lock(&self.conn)?;
        let score = conn
            .query_row(
                &format!(
                    "SELECT {SCORE_COLUMNS} FROM score_history
                     WHERE deal_id = ?1 AND investor_id = ?2
                     ORDER BY computed_at DESC, seq DESC LIMIT 1"
                ),
                params![deal_id, investor_id],
                Self::row_to_score,
            )
            .optional()?;
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::values::recommendation::RecommendationTier;
    use crate::domain::values::sub_scores::SubScoreSet;
    use crate::domain::values::weight_profile::WeightProfile;
    use crate::infrastructure::sqlite::open;
    use chrono::{DateTime, Duration, Utc};

    fn score(value: u8, computed_at: DateTime<Utc>) -> CompositeScore {
        let v = f64::from(value);
        CompositeScore {
            id: uuid::Uuid::new_v4().to_string(),
            deal_id: "deal-1".into(),
            investor_id: "inv-1".into(),
            value,
            tier: RecommendationTier::from_score(value),
            breakdown: SubScoreSet::new(v, v, v, v),
            missing: vec![],
            weights_used: WeightProfile::default(),
            weights_normalized: false,
            computed_at,
        }
    }

    #[test]
    fn test_latest_follows_computed_at_not_insertion() {
        let repo = SqliteScoreRepo::new(open(":memory:").unwrap());
        let now = Utc::now();
        repo.append(&score(90, now)).unwrap();
        repo.append(&score(10, now - Duration::seconds(5))).unwrap();

        let latest = repo.latest("deal-1", "inv-1").unwrap().unwrap();
        assert_eq!(latest.value, 90);

        let values: Vec<u8> = repo
            .history("deal-1", "inv-1", 10)
            .unwrap()
            .iter()
            .map(|s| s.value)
            .collect();
        assert_eq!(values, vec![90, 10]);
    }

    #[test]
    fn test_equal_timestamps_fall_back_to_insertion_order() {
        let repo = SqliteScoreRepo::new(open(":memory:").unwrap());
        let now = Utc::now();
        repo.append(&score(40, now)).unwrap();
        repo.append(&score(60, now)).unwrap();
        assert_eq!(repo.latest("deal-1", "inv-1").unwrap().unwrap().value, 60);
        assert!(repo.latest("deal-1", "inv-2").unwrap().is_none());
    }
}
