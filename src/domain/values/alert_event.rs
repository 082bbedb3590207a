//! Events the alert engine evaluates and the rules it evaluates them against.

use crate::domain::entities::composite_score::CompositeScore;
use crate::domain::entities::thesis_match::ThesisMatch;
use crate::domain::values::alert_type::AlertType;
use crate::domain::values::recommendation::RecommendationTier;
use crate::domain::values::severity::Severity;
use serde::{Deserialize, Serialize};

/// An externally detected condition, e.g. a competitor raise or a portfolio
/// metric moving out of band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalySignal {
    pub investor_id: String,
    pub kind: AlertType,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub deal_id: Option<String>,
    #[serde(default)]
    pub portfolio_id: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AlertEvent {
    Score(CompositeScore),
    Match(ThesisMatch),
    Anomaly(AnomalySignal),
}

impl AlertEvent {
    pub fn label(&self) -> &'static str {
        match self {
            AlertEvent::Score(_) => "score",
            AlertEvent::Match(_) => "match",
            AlertEvent::Anomaly(_) => "anomaly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Score reaches `tier` while the previous score for the pair did not.
    ScoreCrossesInto { tier: RecommendationTier },
    ScoreBelow { threshold: u8 },
    MatchAtLeast { threshold: f64 },
    RedFlagsAtLeast { count: usize },
    Anomaly { kind: AlertType },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRule {
    pub name: String,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub condition: TriggerCondition,
    #[serde(default)]
    pub expires_after_hours: Option<i64>,
}

impl TriggerRule {
    pub fn new(
        name: &str,
        alert_type: AlertType,
        severity: Severity,
        condition: TriggerCondition,
    ) -> Self {
        Self {
            name: name.to_string(),
            alert_type,
            severity,
            condition,
            expires_after_hours: None,
        }
    }

    pub fn expiring_after_hours(mut self, hours: i64) -> Self {
        self.expires_after_hours = Some(hours);
        self
    }
}

/// Rule set used when the caller supplies none.
pub fn default_rules(match_threshold: f64) -> Vec<TriggerRule> {
    let mut rules = vec![
        TriggerRule::new(
            "strong_consider_reached",
            AlertType::DealOpportunity,
            Severity::High,
            TriggerCondition::ScoreCrossesInto {
                tier: RecommendationTier::StrongConsider,
            },
        )
        .expiring_after_hours(24 * 7),
        TriggerRule::new(
            "low_score",
            AlertType::PortfolioAnomaly,
            Severity::High,
            TriggerCondition::ScoreBelow { threshold: 50 },
        ),
        TriggerRule::new(
            "founder_red_flags",
            AlertType::FounderRedFlag,
            Severity::Critical,
            TriggerCondition::RedFlagsAtLeast { count: 1 },
        ),
        TriggerRule::new(
            "thesis_match",
            AlertType::ThesisMatch,
            Severity::Medium,
            TriggerCondition::MatchAtLeast {
                threshold: match_threshold,
            },
        )
        .expiring_after_hours(24 * 14),
    ];
    for (kind, severity) in [
        (AlertType::CompetitiveThreat, Severity::High),
        (AlertType::MarketShift, Severity::Medium),
        (AlertType::FundingRound, Severity::Medium),
        (AlertType::RegulatoryChange, Severity::High),
        (AlertType::PortfolioAnomaly, Severity::High),
        (AlertType::Custom, Severity::Low),
    ] {
        rules.push(TriggerRule::new(
            &format!("anomaly_{kind}"),
            kind,
            severity,
            TriggerCondition::Anomaly { kind },
        ));
    }
    rules
}
