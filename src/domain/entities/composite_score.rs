use crate::domain::values::recommendation::RecommendationTier;
use crate::domain::values::sub_scores::{SubScoreKind, SubScoreSet};
use crate::domain::values::weight_profile::WeightProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One aggregation of sub-scores for a (deal, investor) pair. Entries are
/// appended to history and never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeScore {
    pub id: String,
    pub deal_id: String,
    pub investor_id: String,
    pub value: u8,
    pub tier: RecommendationTier,
    pub breakdown: SubScoreSet,
    /// Sub-scores that were absent and counted as zero.
    pub missing: Vec<SubScoreKind>,
    pub weights_used: WeightProfile,
    /// Whether `weights_used` had to be rescaled from the supplied profile.
    pub weights_normalized: bool,
    pub computed_at: DateTime<Utc>,
}

impl CompositeScore {
    pub fn red_flag_count(&self) -> usize {
        self.breakdown.red_flags.len()
    }
}
