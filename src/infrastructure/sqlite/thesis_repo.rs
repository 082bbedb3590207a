use super::{is_unique_violation, lock, parse_json, parse_ts, ts, SharedConnection};
use crate::domain::entities::thesis::Thesis;
use crate::domain::error::DomainError;
use crate::domain::ports::thesis_repository::ThesisRepository;
use rusqlite::{params, OptionalExtension};

const THESIS_COLUMNS: &str =
    "id, investor_id, title, description, criteria, is_active, version, created_at, updated_at";

pub struct SqliteThesisRepo {
    conn: SharedConnection,
}

impl SqliteThesisRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_thesis(row: &rusqlite::Row) -> Result<Thesis, rusqlite::Error> {
        let criteria: String = row.get(4)?;
        let created: String = row.get(7)?;
        let updated: String = row.get(8)?;

        Ok(Thesis {
            id: row.get(0)?,
            investor_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            criteria: parse_json(4, &criteria)?,
            is_active: row.get(5)?,
            version: row.get(6)?,
            created_at: parse_ts(7, &created)?,
            updated_at: parse_ts(8, &updated)?,
        })
    }
}

impl ThesisRepository for SqliteThesisRepo {
    fn add(&self, thesis: &Thesis) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            &format!(
                "INSERT INTO theses ({THESIS_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                thesis.id,
                thesis.investor_id,
                thesis.title,
                thesis.description,
                serde_json::to_string(&thesis.criteria)?,
                thesis.is_active,
                thesis.version,
                ts(&thesis.created_at),
                ts(&thesis.updated_at),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::Conflict(format!("Thesis already exists: {}", thesis.id))
            } else {
                DomainError::Database(format!("Failed to add thesis: {e}"))
            }
        })?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Thesis>, DomainError> {
        let conn = lock(&self.conn)?;
        let thesis = conn
            .query_row(
                &format!("SELECT {THESIS_COLUMNS} FROM theses WHERE id = ?1"),
                params![id],
                Self::row_to_thesis,
            )
            .optional()?;
        Ok(thesis)
    }

    fn replace(&self, thesis: &Thesis) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        let rows = conn
            .execute(
                "UPDATE theses SET title = ?1, description = ?2, criteria = ?3, is_active = ?4,
                    version = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    thesis.title,
                    thesis.description,
                    serde_json::to_string(&thesis.criteria)?,
                    thesis.is_active,
                    thesis.version,
                    ts(&thesis.updated_at),
                    thesis.id,
                ],
            )
            .map_err(|e| DomainError::Database(format!("Failed to update thesis: {e}")))?;
        if rows == 0 {
            return Err(DomainError::NotFound(format!("Thesis not found: {}", thesis.id)));
        }
        Ok(())
    }

    fn list_for_investor(
        &self,
        investor_id: &str,
        include_inactive: bool,
    ) -> Result<Vec<Thesis>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut sql = format!("SELECT {THESIS_COLUMNS} FROM theses WHERE investor_id = ?1");
        if !include_inactive {
            sql.push_str(" AND is_active = 1");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let theses = stmt
            .query_map(params![investor_id], Self::row_to_thesis)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(theses)
    }
}
