use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recommendation bands over the composite score. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationTier {
    Pass,
    Watch,
    Consider,
    StrongConsider,
}

impl RecommendationTier {
    pub fn from_score(value: u8) -> Self {
        match value {
            80.. => RecommendationTier::StrongConsider,
            60..=79 => RecommendationTier::Consider,
            40..=59 => RecommendationTier::Watch,
            _ => RecommendationTier::Pass,
        }
    }
}

impl fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationTier::StrongConsider => write!(f, "strong-consider"),
            RecommendationTier::Consider => write!(f, "consider"),
            RecommendationTier::Watch => write!(f, "watch"),
            RecommendationTier::Pass => write!(f, "pass"),
        }
    }
}

impl FromStr for RecommendationTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strong-consider" | "pursue" => Ok(RecommendationTier::StrongConsider),
            "consider" => Ok(RecommendationTier::Consider),
            "watch" => Ok(RecommendationTier::Watch),
            "pass" => Ok(RecommendationTier::Pass),
            _ => Err(format!("Unknown recommendation tier: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_lower_bounds_inclusive() {
        assert_eq!(RecommendationTier::from_score(80), RecommendationTier::StrongConsider);
        assert_eq!(RecommendationTier::from_score(79), RecommendationTier::Consider);
        assert_eq!(RecommendationTier::from_score(60), RecommendationTier::Consider);
        assert_eq!(RecommendationTier::from_score(59), RecommendationTier::Watch);
        assert_eq!(RecommendationTier::from_score(40), RecommendationTier::Watch);
        assert_eq!(RecommendationTier::from_score(39), RecommendationTier::Pass);
        assert_eq!(RecommendationTier::from_score(0), RecommendationTier::Pass);
    }

    #[test]
    fn test_tiers_are_ordered() {
        assert!(RecommendationTier::StrongConsider > RecommendationTier::Consider);
        assert!(RecommendationTier::Watch > RecommendationTier::Pass);
    }
}
