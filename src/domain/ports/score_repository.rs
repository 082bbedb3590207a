use crate::domain::entities::composite_score::CompositeScore;
use crate::domain::error::DomainError;

/// Append-only composite score history.
pub trait ScoreRepository: Send + Sync {
    fn append(&self, score: &CompositeScore) -> Result<(), DomainError>;
    /// Newest first.
    fn history(
        &self,
        deal_id: &str,
        investor_id: &str,
        limit: usize,
    ) -> Result<Vec<CompositeScore>, DomainError>;
    fn latest(&self, deal_id: &str, investor_id: &str) -> Result<Option<CompositeScore>, DomainError>;
}
