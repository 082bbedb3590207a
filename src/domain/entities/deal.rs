use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The slice of a deal record the scoring pipeline reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_market: Option<String>,
    #[serde(default)]
    pub sectors: Vec<String>,
    pub stage: String,
    pub country: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub business_model: Option<String>,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub growth_rate: Option<f64>,
    #[serde(default)]
    pub burn_rate: Option<f64>,
    #[serde(default)]
    pub team_size: Option<u32>,
    /// Positive traits, e.g. "product-market-fit".
    #[serde(default)]
    pub features: Vec<String>,
    /// Negative traits, e.g. "high-burn".
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Deal {
    pub fn new(name: String, sectors: Vec<String>, stage: String, country: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description: String::new(),
            target_market: None,
            sectors,
            stage,
            country,
            region: None,
            business_model: None,
            revenue: None,
            growth_rate: None,
            burn_rate: None,
            team_size: None,
            features: Vec::new(),
            flags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Text sent to the semantic matcher.
    pub fn pitch_text(&self) -> String {
        match &self.target_market {
            Some(market) => format!("{} {}", self.description, market),
            None => self.description.clone(),
        }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case(flag))
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f.eq_ignore_ascii_case(feature))
    }
}
