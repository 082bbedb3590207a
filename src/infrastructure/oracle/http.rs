use crate::domain::entities::deal::Deal;
use crate::domain::error::DomainError;
use crate::domain::ports::scoring_oracle::ScoringOracle;
use crate::domain::values::sub_scores::SubScoreSet;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Client for the ML scoring service.
pub struct HttpScoringOracle {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    deal_data: DealData<'a>,
}

#[derive(Serialize)]
struct DealData<'a> {
    name: &'a str,
    description: &'a str,
    sector: &'a [String],
    stage: &'a str,
    metrics: DealMetrics,
    team_size: u32,
    founded_date: String,
    location: HashMap<&'static str, &'a str>,
}

#[derive(Serialize)]
struct DealMetrics {
    revenue: f64,
    growth_rate_yoy: f64,
    burn_rate: f64,
}

#[derive(Deserialize)]
struct ScoreResponse {
    breakdown: ScoreBreakdown,
}

#[derive(Deserialize)]
struct ScoreBreakdown {
    market_score: f64,
    traction_score: f64,
    team_score: f64,
    financial_score: f64,
}

#[derive(Serialize)]
struct MatchRequest<'a> {
    pitch_text: &'a str,
    thesis_text: &'a str,
}

#[derive(Deserialize)]
struct MatchResponse {
    similarity_breakdown: SimilarityBreakdown,
}

#[derive(Deserialize)]
struct SimilarityBreakdown {
    semantic_similarity: f64,
}

impl HttpScoringOracle {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, DomainError> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::ExternalService(format!("ML service error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::ExternalService(format!(
                "ML service {status} on {path}: {body}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| DomainError::ExternalService(format!("Malformed ML response from {path}: {e}")))
    }
}

#[async_trait::async_trait]
impl ScoringOracle for HttpScoringOracle {
    async fn compute_sub_scores(&self, deal: &Deal) -> Result<SubScoreSet, DomainError> {
        let mut location = HashMap::from([("country", deal.country.as_str())]);
        if let Some(region) = &deal.region {
            location.insert("region", region.as_str());
        }
        let request = ScoreRequest {
            deal_data: DealData {
                name: &deal.name,
                description: &deal.description,
                sector: &deal.sectors,
                stage: &deal.stage,
                metrics: DealMetrics {
                    revenue: deal.revenue.unwrap_or(0.0),
                    growth_rate_yoy: deal.growth_rate.unwrap_or(0.0),
                    burn_rate: deal.burn_rate.unwrap_or(0.0),
                },
                team_size: deal.team_size.unwrap_or(1).max(1),
                founded_date: deal.created_at.date_naive().to_string(),
                location,
            },
        };

        let resp: ScoreResponse = self.post("/api/v1/score_deal", &request).await?;
        let b = resp.breakdown;
        Ok(SubScoreSet::new(
            b.market_score,
            b.traction_score,
            b.team_score,
            b.financial_score,
        ))
    }

    async fn compute_semantic_similarity(
        &self,
        pitch_text: &str,
        thesis_text: &str,
    ) -> Result<f64, DomainError> {
        let resp: MatchResponse = self
            .post(
                "/api/v1/match_thesis",
                &MatchRequest {
                    pitch_text,
                    thesis_text,
                },
            )
            .await?;
        Ok(resp.similarity_breakdown.semantic_similarity)
    }

    fn name(&self) -> &str {
        "ml-service"
    }
}
