use crate::domain::entities::deal::Deal;
use crate::domain::error::DomainError;
use crate::domain::ports::scoring_oracle::ScoringOracle;
use crate::domain::values::sub_scores::SubScoreSet;

/// Used when no scoring service is configured. Every call fails, so matching
/// falls back to criteria only and `score` requires caller-supplied sub-scores.
pub struct UnavailableOracle;

#[async_trait::async_trait]
impl ScoringOracle for UnavailableOracle {
    async fn compute_sub_scores(&self, _deal: &Deal) -> Result<SubScoreSet, DomainError> {
        Err(DomainError::ExternalService(
            "no scoring service configured (set DEALRANK_ORACLE_URL)".into(),
        ))
    }

    async fn compute_semantic_similarity(
        &self,
        _pitch_text: &str,
        _thesis_text: &str,
    ) -> Result<f64, DomainError> {
        Err(DomainError::ExternalService(
            "no scoring service configured (set DEALRANK_ORACLE_URL)".into(),
        ))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
