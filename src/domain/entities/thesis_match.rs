use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Latest alignment of one deal with one thesis. A new match replaces the old.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThesisMatch {
    pub thesis_id: String,
    pub deal_id: String,
    pub match_score: f64,
    pub semantic_similarity: Option<f64>,
    pub semantic_unavailable: bool,
    /// Label of the deal-breaker that zeroed the score, if any.
    pub vetoed_by: Option<String>,
    pub matched_criteria: BTreeSet<String>,
    pub computed_at: DateTime<Utc>,
}

impl ThesisMatch {
    pub fn is_vetoed(&self) -> bool {
        self.vetoed_by.is_some()
    }
}
