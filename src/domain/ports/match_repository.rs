use crate::domain::entities::thesis_match::ThesisMatch;
use crate::domain::error::DomainError;

/// Keeps only the latest match per (thesis, deal).
pub trait MatchRepository: Send + Sync {
    fn upsert(&self, m: &ThesisMatch) -> Result<(), DomainError>;
    fn get(&self, thesis_id: &str, deal_id: &str) -> Result<Option<ThesisMatch>, DomainError>;
    /// Best score first.
    fn list_for_thesis(
        &self,
        thesis_id: &str,
        min_score: f64,
        limit: usize,
    ) -> Result<Vec<ThesisMatch>, DomainError>;
}
