use super::{is_unique_violation, lock, parse_json, parse_ts, ts, SharedConnection};
use crate::domain::entities::deal::Deal;
use crate::domain::error::DomainError;
use crate::domain::ports::deal_repository::DealRepository;
use rusqlite::{params, OptionalExtension};

const DEAL_COLUMNS: &str = "id, name, description, target_market, sectors, stage, country, region, business_model, revenue, growth_rate, burn_rate, team_size, features, flags, created_at";

pub struct SqliteDealRepo {
    conn: SharedConnection,
}

impl SqliteDealRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_deal(row: &rusqlite::Row) -> Result<Deal, rusqlite::Error> {
        let sectors: String = row.get(4)?;
        let features: String = row.get(13)?;
        let flags: String = row.get(14)?;
        let created: String = row.get(15)?;

        Ok(Deal {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            target_market: row.get(3)?,
            sectors: parse_json(4, &sectors)?,
            stage: row.get(5)?,
            country: row.get(6)?,
            region: row.get(7)?,
            business_model: row.get(8)?,
            revenue: row.get(9)?,
            growth_rate: row.get(10)?,
            burn_rate: row.get(11)?,
            team_size: row.get(12)?,
            features: parse_json(13, &features)?,
            flags: parse_json(14, &flags)?,
            created_at: parse_ts(15, &created)?,
        })
    }
}

impl DealRepository for SqliteDealRepo {
    fn add(&self, deal: &Deal) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            &format!(
                "INSERT INTO deals ({DEAL_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
            ),
            params![
                deal.id,
                deal.name,
                deal.description,
                deal.target_market,
                serde_json::to_string(&deal.sectors)?,
                deal.stage,
                deal.country,
                deal.region,
                deal.business_model,
                deal.revenue,
                deal.growth_rate,
                deal.burn_rate,
                deal.team_size,
                serde_json::to_string(&deal.features)?,
                serde_json::to_string(&deal.flags)?,
                ts(&deal.created_at),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::Conflict(format!("Deal already exists: {}", deal.id))
            } else {
                DomainError::Database(format!("Failed to add deal: {e}"))
            }
        })?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Deal>, DomainError> {
        let conn = lock(&self.conn)?;
        let deal = conn
            .query_row(
                &format!("SELECT {DEAL_COLUMNS} FROM deals WHERE id = ?1"),
                params![id],
                Self::row_to_deal,
            )
            .optional()?;
        Ok(deal)
    }

    fn list_ids(&self) -> Result<Vec<String>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare("SELECT id FROM deals ORDER BY created_at, id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}
