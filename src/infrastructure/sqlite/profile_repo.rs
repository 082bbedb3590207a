use super::{lock, parse_ts, ts, SharedConnection};
use crate::domain::error::DomainError;
use crate::domain::ports::profile_repository::ProfileRepository;
use crate::domain::values::weight_profile::{InvestorProfile, WeightProfile};
use rusqlite::{params, OptionalExtension};

pub struct SqliteProfileRepo {
    conn: SharedConnection,
}

impl SqliteProfileRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_profile(row: &rusqlite::Row) -> Result<InvestorProfile, rusqlite::Error> {
        let updated: String = row.get(5)?;
        Ok(InvestorProfile {
            investor_id: row.get(0)?,
            weights: WeightProfile::new(row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?),
            updated_at: parse_ts(5, &updated)?,
        })
    }
}

impl ProfileRepository for SqliteProfileRepo {
    fn get(&self, investor_id: &str) -> Result<Option<InvestorProfile>, DomainError> {
        let conn = lock(&self.conn)?;
        let profile = conn
            .query_row(
                "SELECT investor_id, market, traction, team, financial, updated_at
                 FROM weight_profiles WHERE investor_id = ?1",
                params![investor_id],
                Self::row_to_profile,
            )
            .optional()?;
        Ok(profile)
    }

    /// Whole-row upsert: readers see either the old or the new profile.
    fn put(&self, profile: &InvestorProfile) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        let w = &profile.weights;
        conn.execute(
            "INSERT INTO weight_profiles (investor_id, market, traction, team, financial, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(investor_id) DO UPDATE SET
                market = excluded.market,
                traction = excluded.traction,
                team = excluded.team,
                financial = excluded.financial,
                updated_at = excluded.updated_at",
            params![
                profile.investor_id,
                w.market,
                w.traction,
                w.team,
                w.financial,
                ts(&profile.updated_at),
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to store weight profile: {e}")))?;
        Ok(())
    }
}
