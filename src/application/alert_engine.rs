//! Turns score, match and anomaly events into deduplicated alerts.

use crate::domain::entities::alert::Alert;
use crate::domain::entities::composite_score::CompositeScore;
use crate::domain::entities::deal::Deal;
use crate::domain::entities::thesis::Thesis;
use crate::domain::entities::thesis_match::ThesisMatch;
use crate::domain::error::DomainError;
use crate::domain::ports::alert_repository::{AlertRepository, InsertOutcome};
use crate::domain::ports::deal_repository::DealRepository;
use crate::domain::ports::score_repository::ScoreRepository;
use crate::domain::ports::thesis_repository::ThesisRepository;
use crate::domain::values::alert_event::{AlertEvent, AnomalySignal, TriggerCondition, TriggerRule};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 2000;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AlertDecision {
    Created { alert: Alert },
    /// An unread alert with the same key exists inside the dedup window.
    Suppressed { rule: String, existing_id: String },
}

impl AlertDecision {
    pub fn created(&self) -> Option<&Alert> {
        match self {
            AlertDecision::Created { alert } => Some(alert),
            AlertDecision::Suppressed { .. } => None,
        }
    }
}

/// Event with its referenced entities resolved.
enum Resolved<'a> {
    Score {
        score: &'a CompositeScore,
        deal: Deal,
        previous: Option<CompositeScore>,
    },
    Match {
        m: &'a ThesisMatch,
        thesis: Thesis,
        deal: Deal,
    },
    Anomaly {
        signal: &'a AnomalySignal,
    },
}

impl Resolved<'_> {
    fn investor_id(&self) -> &str {
        match self {
            Resolved::Score { score, .. } => &score.investor_id,
            Resolved::Match { thesis, .. } => &thesis.investor_id,
            Resolved::Anomaly { signal } => &signal.investor_id,
        }
    }
}

pub struct AlertEngine {
    rules: Vec<TriggerRule>,
    alerts: Arc<dyn AlertRepository>,
    deals: Arc<dyn DealRepository>,
    theses: Arc<dyn ThesisRepository>,
    scores: Arc<dyn ScoreRepository>,
    dedup_window: Duration,
}

impl AlertEngine {
    pub fn new(
        rules: Vec<TriggerRule>,
        alerts: Arc<dyn AlertRepository>,
        deals: Arc<dyn DealRepository>,
        theses: Arc<dyn ThesisRepository>,
        scores: Arc<dyn ScoreRepository>,
        dedup_window: Duration,
    ) -> Self {
        Self {
            rules,
            alerts,
            deals,
            theses,
            scores,
            dedup_window,
        }
    }

    pub fn rules(&self) -> &[TriggerRule] {
        &self.rules
    }

    /// Evaluates `event` against every rule. An empty result means nothing
    /// fired. Unresolvable deal or thesis ids fail the whole call before any
    /// alert is written.
    pub fn evaluate(&self, event: &AlertEvent) -> Result<Vec<AlertDecision>, DomainError> {
        let resolved = self.resolve(event)?;
        let now = Utc::now();
        let since = now - self.dedup_window;
        let mut decisions = Vec::new();

        for rule in &self.rules {
            let Some(mut alert) = self.fire(rule, &resolved) else {
                continue;
            };
            alert.triggered_at = now;
            alert.expires_at = rule.expires_after_hours.map(|h| now + Duration::hours(h));

            match self.alerts.insert_unless_duplicate(&alert, since)? {
                InsertOutcome::Inserted => {
                    info!(
                        alert_id = %alert.id,
                        investor_id = %alert.investor_id,
                        rule = %rule.name,
                        severity = %alert.severity,
                        "alert created"
                    );
                    decisions.push(AlertDecision::Created { alert });
                }
                InsertOutcome::Duplicate { existing_id } => {
                    debug!(rule = %rule.name, existing_id = %existing_id, "alert suppressed by dedup window");
                    decisions.push(AlertDecision::Suppressed {
                        rule: rule.name.clone(),
                        existing_id,
                    });
                }
            }
        }
        debug!(event = event.label(), fired = decisions.len(), "alert evaluation finished");
        Ok(decisions)
    }

    fn resolve<'a>(&self, event: &'a AlertEvent) -> Result<Resolved<'a>, DomainError> {
        match event {
            AlertEvent::Score(score) => {
                let deal = self.deal(&score.deal_id)?;
                let previous = self
                    .scores
                    .history(&score.deal_id, &score.investor_id, 5)?
                    .into_iter()
                    .find(|s| s.id != score.id && s.computed_at <= score.computed_at);
                Ok(Resolved::Score {
                    score,
                    deal,
                    previous,
                })
            }
            AlertEvent::Match(m) => {
                let thesis = self
                    .theses
                    .get(&m.thesis_id)?
                    .ok_or_else(|| DomainError::NotFound(format!("Thesis not found: {}", m.thesis_id)))?;
                let deal = self.deal(&m.deal_id)?;
                Ok(Resolved::Match { m, thesis, deal })
            }
            AlertEvent::Anomaly(signal) => {
                if signal.title.trim().is_empty() {
                    return Err(DomainError::validation("title", "anomaly title is required"));
                }
                if let Some(deal_id) = &signal.deal_id {
                    self.deal(deal_id)?;
                }
                Ok(Resolved::Anomaly { signal })
            }
        }
    }

    fn deal(&self, id: &str) -> Result<Deal, DomainError> {
        self.deals
            .get(id)?
            .ok_or_else(|| DomainError::NotFound(format!("Deal not found: {id}")))
    }

    /// Builds the candidate alert when `rule` fires for the event.
    fn fire(&self, rule: &TriggerRule, event: &Resolved<'_>) -> Option<Alert> {
        let (title, description, deal_ids, portfolio_ids) = match (&rule.condition, event) {
            (
                TriggerCondition::ScoreCrossesInto { tier },
                Resolved::Score {
                    score,
                    deal,
                    previous,
                },
            ) => {
                let was_below = previous.as_ref().map_or(true, |p| p.tier < *tier);
                if score.tier < *tier || !was_below {
                    return None;
                }
                (
                    format!("{} reached {}", deal.name, score.tier),
                    format!(
                        "Deal \"{}\" scored {} and moved into the {} tier.",
                        deal.name, score.value, score.tier
                    ),
                    vec![deal.id.clone()],
                    vec![],
                )
            }
            (TriggerCondition::ScoreBelow { threshold }, Resolved::Score { score, deal, .. }) => {
                if score.value >= *threshold {
                    return None;
                }
                (
                    format!("Low investment score: {}", deal.name),
                    format!(
                        "Deal \"{}\" has a low investment fit score of {}.",
                        deal.name, score.value
                    ),
                    vec![deal.id.clone()],
                    vec![],
                )
            }
            (TriggerCondition::RedFlagsAtLeast { count }, Resolved::Score { score, deal, .. }) => {
                let flags = &score.breakdown.red_flags;
                if flags.is_empty() || flags.len() < *count {
                    return None;
                }
                (
                    format!("Founder red flags on {}", deal.name),
                    format!("{} red flag(s) reported: {}.", flags.len(), flags.join("; ")),
                    vec![deal.id.clone()],
                    vec![],
                )
            }
            (TriggerCondition::MatchAtLeast { threshold }, Resolved::Match { m, thesis, deal }) => {
                if m.is_vetoed() || m.match_score < *threshold {
                    return None;
                }
                let matched: Vec<&str> = m.matched_criteria.iter().map(String::as_str).collect();
                (
                    format!("{} matches thesis \"{}\"", deal.name, thesis.title),
                    format!(
                        "Match score {:.1}. Matched criteria: {}.",
                        m.match_score,
                        if matched.is_empty() {
                            "none".to_string()
                        } else {
                            matched.join(", ")
                        }
                    ),
                    vec![deal.id.clone()],
                    vec![],
                )
            }
            (TriggerCondition::Anomaly { kind }, Resolved::Anomaly { signal }) => {
                if signal.kind != *kind {
                    return None;
                }
                (
                    signal.title.clone(),
                    signal.description.clone(),
                    signal.deal_id.iter().cloned().collect(),
                    signal.portfolio_id.iter().cloned().collect(),
                )
            }
            _ => return None,
        };

        Some(Alert::new(
            event.investor_id().to_string(),
            rule.alert_type,
            rule.severity,
            truncate(&title, MAX_TITLE_LEN),
            truncate(&description, MAX_DESCRIPTION_LEN),
            deal_ids,
            portfolio_ids,
            rule.name.clone(),
        ))
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
