//! Port to the external scoring service.
//!
//! Sub-score computation and semantic similarity live outside this crate.
//! Every failure, including transport errors and malformed responses, is
//! reported as `DomainError::ExternalService`.

use crate::domain::entities::deal::Deal;
use crate::domain::error::DomainError;
use crate::domain::values::sub_scores::SubScoreSet;
use async_trait::async_trait;

#[async_trait]
pub trait ScoringOracle: Send + Sync {
    async fn compute_sub_scores(&self, deal: &Deal) -> Result<SubScoreSet, DomainError>;

    /// Similarity between a pitch and a thesis text, on a 0–100 scale.
    async fn compute_semantic_similarity(
        &self,
        pitch_text: &str,
        thesis_text: &str,
    ) -> Result<f64, DomainError>;

    /// Oracle name for logging
    fn name(&self) -> &str;
}
