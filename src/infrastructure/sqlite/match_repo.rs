use super::{lock, parse_json, parse_ts, ts, SharedConnection};
use crate::domain::entities::thesis_match::ThesisMatch;
use crate::domain::error::DomainError;
use crate::domain::ports::match_repository::MatchRepository;
use rusqlite::{params, OptionalExtension};

const MATCH_COLUMNS: &str = "thesis_id, deal_id, match_score, semantic_similarity, semantic_unavailable, vetoed_by, matched_criteria, computed_at";

pub struct SqliteMatchRepo {
    conn: SharedConnection,
}

impl SqliteMatchRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_match(row: &rusqlite::Row) -> Result<ThesisMatch, rusqlite::Error> {
        let matched: String = row.get(6)?;
        let computed: String = row.get(7)?;
        Ok(ThesisMatch {
            thesis_id: row.get(0)?,
            deal_id: row.get(1)?,
            match_score: row.get(2)?,
            semantic_similarity: row.get(3)?,
            semantic_unavailable: row.get(4)?,
            vetoed_by: row.get(5)?,
            matched_criteria: parse_json(6, &matched)?,
            computed_at: parse_ts(7, &computed)?,
        })
    }
}

impl MatchRepository for SqliteMatchRepo {
    /// Keeps whichever match was computed last; a stale write is dropped.
    fn upsert(&self, m: &ThesisMatch) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            &format!(
                "INSERT INTO thesis_matches ({MATCH_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(thesis_id, deal_id) DO UPDATE SET
                    match_score = excluded.match_score,
                    semantic_similarity = excluded.semantic_similarity,
                    semantic_unavailable = excluded.semantic_unavailable,
                    vetoed_by = excluded.vetoed_by,
                    matched_criteria = excluded.matched_criteria,
                    computed_at = excluded.computed_at
                 WHERE excluded.computed_at >= thesis_matches.computed_at"
            ),
            params![
                m.thesis_id,
                m.deal_id,
                m.match_score,
                m.semantic_similarity,
                m.semantic_unavailable,
                m.vetoed_by,
                serde_json::to_string(&m.matched_criteria)?,
                ts(&m.computed_at),
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to store match: {e}")))?;
        Ok(())
    }

    fn get(&self, thesis_id: &str, deal_id: &str) -> Result<Option<ThesisMatch>, DomainError> {
        let conn = lock(&self.conn)?;
        let m = conn
            .query_row(
                &format!(
                    "SELECT {MATCH_COLUMNS} FROM thesis_matches WHERE thesis_id = ?1 AND deal_id = ?2"
                ),
                params![thesis_id, deal_id],
                Self::row_to_match,
            )
            .optional()?;
        Ok(m)
    }

    fn list_for_thesis(
        &self,
        thesis_id: &str,
        min_score: f64,
        limit: usize,
    ) -> Result<Vec<ThesisMatch>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MATCH_COLUMNS} FROM thesis_matches
             WHERE thesis_id = ?1 AND match_score >= ?2
             ORDER BY match_score DESC, deal_id ASC LIMIT ?3"
        ))?;
        let matches = stmt
            .query_map(params![thesis_id, min_score, limit as i64], Self::row_to_match)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite::open;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::BTreeSet;

    fn scored(score: f64, computed_at: DateTime<Utc>) -> ThesisMatch {
        ThesisMatch {
            thesis_id: "t-1".into(),
            deal_id: "d-1".into(),
            match_score: score,
            semantic_similarity: Some(score),
            semantic_unavailable: false,
            vetoed_by: None,
            matched_criteria: BTreeSet::from(["sector".to_string()]),
            computed_at,
        }
    }

    #[test]
    fn test_stale_upsert_does_not_replace_newer_match() {
        let repo = SqliteMatchRepo::new(open(":memory:").unwrap());
        let now = Utc::now();
        repo.upsert(&scored(80.0, now)).unwrap();
        repo.upsert(&scored(20.0, now - Duration::seconds(5))).unwrap();
        assert_eq!(repo.get("t-1", "d-1").unwrap().unwrap().match_score, 80.0);

        repo.upsert(&scored(55.0, now + Duration::seconds(1))).unwrap();
        let stored = repo.get("t-1", "d-1").unwrap().unwrap();
        assert_eq!(stored.match_score, 55.0);
        assert_eq!(repo.list_for_thesis("t-1", 0.0, 10).unwrap().len(), 1);
    }
}
