//! Composite score aggregation and the use cases around it.

use crate::application::external::with_timeout;
use crate::domain::entities::composite_score::CompositeScore;
use crate::domain::error::DomainError;
use crate::domain::ports::deal_repository::DealRepository;
use crate::domain::ports::profile_repository::ProfileRepository;
use crate::domain::ports::score_repository::ScoreRepository;
use crate::domain::ports::scoring_oracle::ScoringOracle;
use crate::domain::values::recommendation::RecommendationTier;
use crate::domain::values::sub_scores::{SubScoreKind, SubScoreSet};
use crate::domain::values::weight_profile::{InvestorProfile, WeightProfile};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Combines `sub_scores` under `weights` into a composite score.
///
/// Absent sub-scores count as zero and are listed in `missing`. Weights off
/// by more than the tolerance are rescaled first and `weights_normalized`
/// is set. The weighted sum is snapped to six decimals before
/// round-half-to-even so float noise cannot flip a tie.
pub fn aggregate(
    deal_id: &str,
    investor_id: &str,
    sub_scores: &SubScoreSet,
    weights: &WeightProfile,
) -> Result<CompositeScore, DomainError> {
    sub_scores.validate()?;
    let used = weights.normalized()?;
    let weights_normalized = !weights.is_normalized();

    let raw: f64 = SubScoreKind::all()
        .into_iter()
        .map(|kind| weight_for(&used, kind) * sub_scores.get(kind).unwrap_or(0.0))
        .sum();
    let snapped = (raw * 1e6).round() / 1e6;
    let value = snapped.round_ties_even().clamp(0.0, 100.0) as u8;

    Ok(CompositeScore {
        id: uuid::Uuid::new_v4().to_string(),
        deal_id: deal_id.to_string(),
        investor_id: investor_id.to_string(),
        value,
        tier: RecommendationTier::from_score(value),
        breakdown: sub_scores.clone(),
        missing: sub_scores.missing(),
        weights_used: used,
        weights_normalized,
        computed_at: Utc::now(),
    })
}

fn weight_for(w: &WeightProfile, kind: SubScoreKind) -> f64 {
    match kind {
        SubScoreKind::Market => w.market,
        SubScoreKind::Traction => w.traction,
        SubScoreKind::Team => w.team,
        SubScoreKind::Financial => w.financial,
    }
}

#[derive(Debug, Serialize)]
pub struct ScoreComparison {
    pub scores: Vec<CompositeScore>,
    /// Deals with no score yet for this investor.
    pub unscored: Vec<String>,
    pub highest: Option<u8>,
    pub lowest: Option<u8>,
    pub average: Option<f64>,
}

pub struct ScoringUseCase {
    deals: Arc<dyn DealRepository>,
    profiles: Arc<dyn ProfileRepository>,
    scores: Arc<dyn ScoreRepository>,
    oracle: Arc<dyn ScoringOracle>,
    oracle_timeout: Duration,
}

impl ScoringUseCase {
    pub fn new(
        deals: Arc<dyn DealRepository>,
        profiles: Arc<dyn ProfileRepository>,
        scores: Arc<dyn ScoreRepository>,
        oracle: Arc<dyn ScoringOracle>,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            deals,
            profiles,
            scores,
            oracle,
            oracle_timeout,
        }
    }

    /// The investor's stored profile, or the default one.
    pub fn weight_profile(&self, investor_id: &str) -> Result<WeightProfile, DomainError> {
        Ok(self
            .profiles
            .get(investor_id)?
            .map(|p| p.weights)
            .unwrap_or_default())
    }

    /// Stores a normalized copy of `weights` as the investor's profile.
    pub fn set_weight_profile(
        &self,
        investor_id: &str,
        weights: WeightProfile,
    ) -> Result<InvestorProfile, DomainError> {
        let profile = InvestorProfile {
            investor_id: investor_id.to_string(),
            weights: weights.normalized()?,
            updated_at: Utc::now(),
        };
        self.profiles.put(&profile)?;
        info!(investor_id, "weight profile updated");
        Ok(profile)
    }

    /// Aggregates caller-supplied sub-scores and appends the result to history.
    pub fn aggregate(
        &self,
        deal_id: &str,
        investor_id: &str,
        sub_scores: &SubScoreSet,
    ) -> Result<CompositeScore, DomainError> {
        if self.deals.get(deal_id)?.is_none() {
            return Err(DomainError::NotFound(format!("Deal not found: {deal_id}")));
        }
        let weights = self.weight_profile(investor_id)?;
        let score = aggregate(deal_id, investor_id, sub_scores, &weights)?;
        self.scores.append(&score)?;
        debug!(deal_id, investor_id, value = score.value, tier = %score.tier, "composite score recorded");
        Ok(score)
    }

    /// Fetches sub-scores from the oracle, then aggregates and records them.
    pub async fn score_deal(
        &self,
        deal_id: &str,
        investor_id: &str,
    ) -> Result<CompositeScore, DomainError> {
        let deal = self
            .deals
            .get(deal_id)?
            .ok_or_else(|| DomainError::NotFound(format!("Deal not found: {deal_id}")))?;
        let sub_scores = with_timeout(
            self.oracle.name(),
            self.oracle_timeout,
            self.oracle.compute_sub_scores(&deal),
        )
        .await?;
        self.aggregate(deal_id, investor_id, &sub_scores)
    }

    pub fn history(
        &self,
        deal_id: &str,
        investor_id: &str,
        limit: usize,
    ) -> Result<Vec<CompositeScore>, DomainError> {
        self.scores.history(deal_id, investor_id, limit)
    }

    pub fn current(
        &self,
        deal_id: &str,
        investor_id: &str,
    ) -> Result<Option<CompositeScore>, DomainError> {
        self.scores.latest(deal_id, investor_id)
    }

    pub fn compare(
        &self,
        deal_ids: &[String],
        investor_id: &str,
    ) -> Result<ScoreComparison, DomainError> {
        let mut scores = Vec::new();
        let mut unscored = Vec::new();
        for id in deal_ids {
            match self.scores.latest(id, investor_id)? {
                Some(s) => scores.push(s),
                None => unscored.push(id.clone()),
            }
        }
        let values: Vec<u8> = scores.iter().map(|s| s.value).collect();
        let average = if values.is_empty() {
            None
        } else {
            Some(values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64)
        };
        Ok(ScoreComparison {
            highest: values.iter().max().copied(),
            lowest: values.iter().min().copied(),
            average,
            scores,
            unscored,
        })
    }
}
