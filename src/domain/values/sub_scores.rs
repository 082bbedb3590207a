use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four sub-score dimensions that feed the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubScoreKind {
    Market,
    Traction,
    Team,
    Financial,
}

impl SubScoreKind {
    pub fn all() -> [SubScoreKind; 4] {
        [
            SubScoreKind::Market,
            SubScoreKind::Traction,
            SubScoreKind::Team,
            SubScoreKind::Financial,
        ]
    }
}

impl fmt::Display for SubScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubScoreKind::Market => write!(f, "market"),
            SubScoreKind::Traction => write!(f, "traction"),
            SubScoreKind::Team => write!(f, "team"),
            SubScoreKind::Financial => write!(f, "financial"),
        }
    }
}

/// Sub-scores produced by the scoring oracle for one deal at one point in time.
///
/// Any of the core four may be absent; the aggregator counts an absent
/// sub-score as zero and flags it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScoreSet {
    #[serde(default)]
    pub market: Option<f64>,
    #[serde(default)]
    pub traction: Option<f64>,
    #[serde(default)]
    pub team: Option<f64>,
    #[serde(default)]
    pub financial: Option<f64>,
    #[serde(default)]
    pub founder: Option<f64>,
    #[serde(default)]
    pub red_flags: Vec<String>,
}

impl SubScoreSet {
    pub fn new(market: f64, traction: f64, team: f64, financial: f64) -> Self {
        Self {
            market: Some(market),
            traction: Some(traction),
            team: Some(team),
            financial: Some(financial),
            founder: None,
            red_flags: Vec::new(),
        }
    }

    pub fn get(&self, kind: SubScoreKind) -> Option<f64> {
        match kind {
            SubScoreKind::Market => self.market,
            SubScoreKind::Traction => self.traction,
            SubScoreKind::Team => self.team,
            SubScoreKind::Financial => self.financial,
        }
    }

    pub fn missing(&self) -> Vec<SubScoreKind> {
        SubScoreKind::all()
            .into_iter()
            .filter(|k| self.get(*k).is_none())
            .collect()
    }

    /// Every present value, founder included, must be a number within 0–100.
    pub fn validate(&self) -> Result<(), DomainError> {
        let present = SubScoreKind::all()
            .into_iter()
            .map(|k| (k.to_string(), self.get(k)))
            .chain(std::iter::once(("founder".to_string(), self.founder)));
        for (name, value) in present {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(DomainError::validation(
                        format!("sub_scores.{name}"),
                        "sub-score is not a number",
                    ));
                }
                if !(0.0..=100.0).contains(&v) {
                    return Err(DomainError::validation(
                        format!("sub_scores.{name}"),
                        format!("sub-score must be within 0-100, got {v}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_names_field() {
        let mut s = SubScoreSet::new(50.0, 101.0, 50.0, 50.0);
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("sub_scores.traction"));

        s.traction = Some(40.0);
        s.founder = Some(-1.0);
        assert!(s.validate().unwrap_err().to_string().contains("sub_scores.founder"));
    }

    #[test]
    fn test_missing_lists_absent_dimensions() {
        let s = SubScoreSet {
            market: Some(10.0),
            financial: Some(20.0),
            ..Default::default()
        };
        assert_eq!(s.missing(), vec![SubScoreKind::Traction, SubScoreKind::Team]);
    }
}
