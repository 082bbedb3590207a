use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    DealOpportunity,
    ThesisMatch,
    FounderRedFlag,
    PortfolioAnomaly,
    CompetitiveThreat,
    MarketShift,
    FundingRound,
    RegulatoryChange,
    Custom,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertType::DealOpportunity => write!(f, "deal_opportunity"),
            AlertType::ThesisMatch => write!(f, "thesis_match"),
            AlertType::FounderRedFlag => write!(f, "founder_red_flag"),
            AlertType::PortfolioAnomaly => write!(f, "portfolio_anomaly"),
            AlertType::CompetitiveThreat => write!(f, "competitive_threat"),
            AlertType::MarketShift => write!(f, "market_shift"),
            AlertType::FundingRound => write!(f, "funding_round"),
            AlertType::RegulatoryChange => write!(f, "regulatory_change"),
            AlertType::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deal_opportunity" => Ok(AlertType::DealOpportunity),
            "thesis_match" => Ok(AlertType::ThesisMatch),
            "founder_red_flag" => Ok(AlertType::FounderRedFlag),
            "portfolio_anomaly" => Ok(AlertType::PortfolioAnomaly),
            "competitive_threat" => Ok(AlertType::CompetitiveThreat),
            "market_shift" => Ok(AlertType::MarketShift),
            "funding_round" => Ok(AlertType::FundingRound),
            "regulatory_change" => Ok(AlertType::RegulatoryChange),
            "custom" => Ok(AlertType::Custom),
            _ => Err(format!("Unknown alert type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Unread,
    Read,
    Archived,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertStatus::Unread => write!(f, "unread"),
            AlertStatus::Read => write!(f, "read"),
            AlertStatus::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unread" => Ok(AlertStatus::Unread),
            "read" => Ok(AlertStatus::Read),
            "archived" => Ok(AlertStatus::Archived),
            _ => Err(format!("Unknown alert status: {s}")),
        }
    }
}
