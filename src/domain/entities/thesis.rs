use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A criterion that a deal-breaker can require to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    Sector,
    Stage,
    Geography,
    BusinessModel,
    MinRevenue,
    MinGrowthRate,
    MinTeamSize,
    MaxBurnRate,
}

impl CriterionKind {
    pub fn name(&self) -> &'static str {
        match self {
            CriterionKind::Sector => "sector",
            CriterionKind::Stage => "stage",
            CriterionKind::Geography => "geography",
            CriterionKind::BusinessModel => "business_model",
            CriterionKind::MinRevenue => "min_revenue",
            CriterionKind::MinGrowthRate => "min_growth_rate",
            CriterionKind::MinTeamSize => "min_team_size",
            CriterionKind::MaxBurnRate => "max_burn_rate",
        }
    }
}

/// A hard veto on a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealBreaker {
    /// The named criterion must be satisfied.
    Criterion(CriterionKind),
    /// The deal must not carry this flag.
    Flag(String),
    /// The deal must carry this must-have feature.
    MustHave(String),
}

impl DealBreaker {
    pub fn label(&self) -> String {
        match self {
            DealBreaker::Criterion(kind) => kind.name().to_string(),
            DealBreaker::Flag(flag) => format!("flag:{flag}"),
            DealBreaker::MustHave(feature) => format!("must_have:{feature}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThesisCriteria {
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub stages: Vec<String>,
    #[serde(default)]
    pub geographies: Vec<String>,
    #[serde(default)]
    pub business_models: Vec<String>,
    #[serde(default)]
    pub min_revenue: Option<f64>,
    #[serde(default)]
    pub min_growth_rate: Option<f64>,
    #[serde(default)]
    pub min_team_size: Option<u32>,
    #[serde(default)]
    pub max_burn_rate: Option<f64>,
    #[serde(default)]
    pub must_have_features: Vec<String>,
    #[serde(default)]
    pub deal_breakers: Vec<DealBreaker>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thesis {
    pub id: String,
    pub investor_id: String,
    pub title: String,
    /// Free text compared semantically against deal pitches.
    pub description: String,
    pub criteria: ThesisCriteria,
    pub is_active: bool,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Thesis {
    pub fn new(
        investor_id: String,
        title: String,
        description: String,
        criteria: ThesisCriteria,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            investor_id,
            title,
            description,
            criteria,
            is_active: true,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields an investor may replace on an existing thesis.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThesisUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub criteria: Option<ThesisCriteria>,
}
