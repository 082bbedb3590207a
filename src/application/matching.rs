//! Thesis matching: per-criterion evaluation, deal-breaker veto and the
//! criteria/semantic blend.

use crate::application::external::with_timeout;
use crate::config::MatchConfig;
use crate::domain::entities::deal::Deal;
use crate::domain::entities::thesis::{CriterionKind, DealBreaker, Thesis, ThesisCriteria};
use crate::domain::entities::thesis_match::ThesisMatch;
use crate::domain::error::DomainError;
use crate::domain::ports::deal_repository::DealRepository;
use crate::domain::ports::match_repository::MatchRepository;
use crate::domain::ports::scoring_oracle::ScoringOracle;
use crate::domain::ports::thesis_repository::ThesisRepository;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of every configured criterion for one deal, keyed by name.
#[derive(Debug, Default)]
pub struct CriteriaReport {
    pub results: Vec<(String, bool)>,
}

impl CriteriaReport {
    pub fn satisfied(&self) -> BTreeSet<String> {
        self.results
            .iter()
            .filter(|(_, ok)| *ok)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn fraction(&self) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        let hit = self.results.iter().filter(|(_, ok)| *ok).count();
        Some(hit as f64 / self.results.len() as f64)
    }

    fn outcome(&self, name: &str) -> Option<bool> {
        self.results
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ok)| *ok)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThesisMatcher {
    config: MatchConfig,
}

impl ThesisMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Evaluates each configured criterion independently. Empty filters and
    /// absent thresholds are not criteria.
    pub fn evaluate_criteria(&self, criteria: &ThesisCriteria, deal: &Deal) -> CriteriaReport {
        let mut results = Vec::new();

        if !criteria.sectors.is_empty() {
            let ok = criteria
                .sectors
                .iter()
                .any(|s| deal.sectors.iter().any(|d| d.eq_ignore_ascii_case(s)));
            results.push((CriterionKind::Sector.name().to_string(), ok));
        }
        if !criteria.stages.is_empty() {
            let ok = criteria.stages.iter().any(|s| s.eq_ignore_ascii_case(&deal.stage));
            results.push((CriterionKind::Stage.name().to_string(), ok));
        }
        if !criteria.geographies.is_empty() {
            let country = deal.country.to_lowercase();
            let region = deal.region.as_deref().unwrap_or_default().to_lowercase();
            let ok = criteria.geographies.iter().any(|g| {
                let g = g.to_lowercase();
                country.contains(&g) || (!region.is_empty() && region.contains(&g))
            });
            results.push((CriterionKind::Geography.name().to_string(), ok));
        }
        if !criteria.business_models.is_empty() {
            let ok = deal.business_model.as_deref().is_some_and(|m| {
                criteria
                    .business_models
                    .iter()
                    .any(|b| b.eq_ignore_ascii_case(m))
            });
            results.push((CriterionKind::BusinessModel.name().to_string(), ok));
        }

        // A threshold the deal has no metric for is unmet.
        if let Some(min) = criteria.min_revenue {
            let ok = deal.revenue.is_some_and(|v| v >= min);
            results.push((CriterionKind::MinRevenue.name().to_string(), ok));
        }
        if let Some(min) = criteria.min_growth_rate {
            let ok = deal.growth_rate.is_some_and(|v| v >= min);
            results.push((CriterionKind::MinGrowthRate.name().to_string(), ok));
        }
        if let Some(min) = criteria.min_team_size {
            let ok = deal.team_size.is_some_and(|v| v >= min);
            results.push((CriterionKind::MinTeamSize.name().to_string(), ok));
        }
        if let Some(max) = criteria.max_burn_rate {
            let ok = deal.burn_rate.is_some_and(|v| v <= max);
            results.push((CriterionKind::MaxBurnRate.name().to_string(), ok));
        }

        for feature in &criteria.must_have_features {
            results.push((format!("must_have:{feature}"), deal.has_feature(feature)));
        }

        CriteriaReport { results }
    }

    /// First violated deal-breaker, if any. A criterion deal-breaker on a
    /// criterion the thesis does not configure cannot be violated.
    pub fn veto(&self, thesis: &Thesis, deal: &Deal) -> Option<String> {
        let report = self.evaluate_criteria(&thesis.criteria, deal);
        self.veto_from(&thesis.criteria, deal, &report)
    }

    fn veto_from(
        &self,
        criteria: &ThesisCriteria,
        deal: &Deal,
        report: &CriteriaReport,
    ) -> Option<String> {
        criteria
            .deal_breakers
            .iter()
            .find(|breaker| match breaker {
                DealBreaker::Criterion(kind) => report.outcome(kind.name()) == Some(false),
                DealBreaker::Flag(flag) => deal.has_flag(flag),
                DealBreaker::MustHave(feature) => !deal.has_feature(feature),
            })
            .map(DealBreaker::label)
    }

    /// Scores `deal` against `thesis`.
    ///
    /// `semantic_similarity` of `None` (or a non-finite value) falls back to
    /// the criteria score at full weight. With no criteria configured the
    /// semantic score stands alone; with neither the score is zero.
    pub fn evaluate(
        &self,
        thesis: &Thesis,
        deal: &Deal,
        semantic_similarity: Option<f64>,
    ) -> ThesisMatch {
        let report = self.evaluate_criteria(&thesis.criteria, deal);
        let vetoed_by = self.veto_from(&thesis.criteria, deal, &report);
        let semantic = semantic_similarity
            .filter(|s| s.is_finite())
            .map(|s| s.clamp(0.0, 100.0));

        let match_score = if vetoed_by.is_some() {
            0.0
        } else {
            let criteria_score = report.fraction().map(|f| f * 100.0);
            let blended = match (criteria_score, semantic) {
                (Some(c), Some(s)) => {
                    self.config.criteria_weight * c + self.config.semantic_weight * s
                }
                (Some(c), None) => c,
                (None, Some(s)) => s,
                (None, None) => 0.0,
            };
            round2(blended.clamp(0.0, 100.0))
        };

        ThesisMatch {
            thesis_id: thesis.id.clone(),
            deal_id: deal.id.clone(),
            match_score,
            semantic_similarity: semantic,
            semantic_unavailable: semantic.is_none() && vetoed_by.is_none(),
            vetoed_by,
            matched_criteria: report.satisfied(),
            computed_at: Utc::now(),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub struct MatchUseCase {
    theses: Arc<dyn ThesisRepository>,
    deals: Arc<dyn DealRepository>,
    matches: Arc<dyn MatchRepository>,
    oracle: Arc<dyn ScoringOracle>,
    matcher: ThesisMatcher,
    oracle_timeout: Duration,
}

impl MatchUseCase {
    pub fn new(
        theses: Arc<dyn ThesisRepository>,
        deals: Arc<dyn DealRepository>,
        matches: Arc<dyn MatchRepository>,
        oracle: Arc<dyn ScoringOracle>,
        matcher: ThesisMatcher,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            theses,
            deals,
            matches,
            oracle,
            matcher,
            oracle_timeout,
        }
    }

    pub fn active_thesis(&self, thesis_id: &str) -> Result<Thesis, DomainError> {
        let thesis = self
            .theses
            .get(thesis_id)?
            .ok_or_else(|| DomainError::NotFound(format!("Thesis not found: {thesis_id}")))?;
        if !thesis.is_active {
            return Err(DomainError::validation(
                "thesis_id",
                format!("thesis {thesis_id} is inactive"),
            ));
        }
        Ok(thesis)
    }

    pub async fn match_deal(&self, thesis_id: &str, deal_id: &str) -> Result<ThesisMatch, DomainError> {
        let thesis = self.active_thesis(thesis_id)?;
        self.match_with(&thesis, deal_id).await
    }

    /// Matches against a thesis already loaded and checked active.
    async fn match_with(&self, thesis: &Thesis, deal_id: &str) -> Result<ThesisMatch, DomainError> {
        let deal = self
            .deals
            .get(deal_id)?
            .ok_or_else(|| DomainError::NotFound(format!("Deal not found: {deal_id}")))?;

        // Vetoed deals score zero whatever the oracle says.
        let semantic = if self.matcher.veto(thesis, &deal).is_some() {
            None
        } else {
            match with_timeout(
                self.oracle.name(),
                self.oracle_timeout,
                self.oracle
                    .compute_semantic_similarity(&deal.pitch_text(), &thesis.description),
            )
            .await
            {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!(thesis_id = %thesis.id, deal_id, error = %e, "semantic similarity unavailable");
                    None
                }
            }
        };

        let result = self.matcher.evaluate(thesis, &deal, semantic);
        self.matches.upsert(&result)?;
        debug!(thesis_id = %thesis.id, deal_id, score = result.match_score, "thesis match recorded");
        Ok(result)
    }

    pub fn top_matches(
        &self,
        thesis_id: &str,
        min_score: f64,
        limit: usize,
    ) -> Result<Vec<ThesisMatch>, DomainError> {
        if self.theses.get(thesis_id)?.is_none() {
            return Err(DomainError::NotFound(format!("Thesis not found: {thesis_id}")));
        }
        self.matches.list_for_thesis(thesis_id, min_score, limit)
    }

    /// Stored matches grouped by thesis id for every thesis the investor has,
    /// active or not. Theses with no qualifying match are left out.
    pub fn matches_for_investor(
        &self,
        investor_id: &str,
        min_score: f64,
        limit: usize,
    ) -> Result<BTreeMap<String, Vec<ThesisMatch>>, DomainError> {
        let mut out = BTreeMap::new();
        for thesis in self.theses.list_for_investor(investor_id, true)? {
            let found = self.matches.list_for_thesis(&thesis.id, min_score, limit)?;
            if !found.is_empty() {
                out.insert(thesis.id, found);
            }
        }
        Ok(out)
    }
}
