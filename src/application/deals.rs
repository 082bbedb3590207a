use crate::domain::entities::deal::Deal;
use crate::domain::error::DomainError;
use crate::domain::ports::deal_repository::DealRepository;
use std::sync::Arc;
use tracing::info;

pub struct DealUseCase {
    repo: Arc<dyn DealRepository>,
}

impl DealUseCase {
    pub fn new(repo: Arc<dyn DealRepository>) -> Self {
        Self { repo }
    }

    pub fn add(&self, deal: Deal) -> Result<Deal, DomainError> {
        if deal.name.trim().is_empty() {
            return Err(DomainError::validation("name", "deal name is required"));
        }
        if deal.stage.trim().is_empty() {
            return Err(DomainError::validation("stage", "deal stage is required"));
        }
        let metrics = [
            ("revenue", deal.revenue),
            ("growth_rate", deal.growth_rate),
            ("burn_rate", deal.burn_rate),
        ];
        for (field, value) in metrics {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(DomainError::validation(field, "must be a finite number"));
            }
        }
        self.repo.add(&deal)?;
        info!(deal_id = %deal.id, name = %deal.name, "deal added");
        Ok(deal)
    }

    pub fn get(&self, id: &str) -> Result<Deal, DomainError> {
        self.repo
            .get(id)?
            .ok_or_else(|| DomainError::NotFound(format!("Deal not found: {id}")))
    }

    pub fn list_ids(&self) -> Result<Vec<String>, DomainError> {
        self.repo.list_ids()
    }
}
