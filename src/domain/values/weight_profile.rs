//! Per-investor weights used to blend the four core sub-scores.

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    pub market: f64,
    pub traction: f64,
    pub team: f64,
    pub financial: f64,
}

impl Default for WeightProfile {
    fn default() -> Self {
        Self {
            market: 0.30,
            traction: 0.25,
            team: 0.25,
            financial: 0.20,
        }
    }
}

impl WeightProfile {
    pub fn new(market: f64, traction: f64, team: f64, financial: f64) -> Self {
        Self {
            market,
            traction,
            team,
            financial,
        }
    }

    fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("market", self.market),
            ("traction", self.traction),
            ("team", self.team),
            ("financial", self.financial),
        ]
    }

    pub fn sum(&self) -> f64 {
        self.market + self.traction + self.team + self.financial
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_TOLERANCE
    }

    /// Rejects negative or non-finite weights.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, w) in self.named() {
            if !w.is_finite() {
                return Err(DomainError::validation(
                    format!("weights.{name}"),
                    "weight must be a finite number",
                ));
            }
            if w < 0.0 {
                return Err(DomainError::validation(
                    format!("weights.{name}"),
                    format!("weight must be non-negative, got {w}"),
                ));
            }
        }
        Ok(())
    }

    /// Proportionally rescales the weights so they sum to 1.0.
    ///
    /// A profile whose weights are all zero cannot be rescaled and yields a
    /// `Conflict`, as does a result that still misses the tolerance.
    pub fn normalized(&self) -> Result<WeightProfile, DomainError> {
        self.validate()?;
        let sum = self.sum();
        if sum <= 0.0 {
            return Err(DomainError::Conflict(
                "weight profile sums to zero and cannot be normalized".into(),
            ));
        }
        if self.is_normalized() {
            return Ok(*self);
        }
        let scaled = WeightProfile {
            market: self.market / sum,
            traction: self.traction / sum,
            team: self.team / sum,
            financial: self.financial / sum,
        };
        if !scaled.is_normalized() {
            return Err(DomainError::Conflict(format!(
                "weight profile sums to {} after normalization",
                scaled.sum()
            )));
        }
        Ok(scaled)
    }
}

/// A weight profile as stored for one investor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestorProfile {
    pub investor_id: String,
    pub weights: WeightProfile,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
