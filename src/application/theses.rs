use crate::domain::entities::thesis::{Thesis, ThesisCriteria, ThesisUpdate};
use crate::domain::error::DomainError;
use crate::domain::ports::thesis_repository::ThesisRepository;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 10_000;

pub struct ThesisUseCase {
    repo: Arc<dyn ThesisRepository>,
}

impl ThesisUseCase {
    pub fn new(repo: Arc<dyn ThesisRepository>) -> Self {
        Self { repo }
    }

    pub fn create(
        &self,
        investor_id: &str,
        title: String,
        description: String,
        criteria: ThesisCriteria,
    ) -> Result<Thesis, DomainError> {
        validate_text(&title, &description)?;
        validate_criteria(&criteria)?;
        let thesis = Thesis::new(investor_id.to_string(), title, description, criteria);
        self.repo.add(&thesis)?;
        info!(thesis_id = %thesis.id, investor_id, "thesis created");
        Ok(thesis)
    }

    /// Applies `update` to a copy and writes the copy back whole.
    pub fn update(
        &self,
        thesis_id: &str,
        investor_id: &str,
        update: ThesisUpdate,
    ) -> Result<Thesis, DomainError> {
        let mut thesis = self.owned(thesis_id, investor_id)?;
        if let Some(title) = update.title {
            thesis.title = title;
        }
        if let Some(description) = update.description {
            thesis.description = description;
        }
        if let Some(criteria) = update.criteria {
            validate_criteria(&criteria)?;
            thesis.criteria = criteria;
        }
        validate_text(&thesis.title, &thesis.description)?;
        thesis.version += 1;
        thesis.updated_at = Utc::now();
        self.repo.replace(&thesis)?;
        info!(thesis_id, version = thesis.version, "thesis updated");
        Ok(thesis)
    }

    /// Soft delete. Matches keep referencing the thesis.
    pub fn deactivate(&self, thesis_id: &str, investor_id: &str) -> Result<Thesis, DomainError> {
        let mut thesis = self.owned(thesis_id, investor_id)?;
        if thesis.is_active {
            thesis.is_active = false;
            thesis.updated_at = Utc::now();
            self.repo.replace(&thesis)?;
            info!(thesis_id, "thesis deactivated");
        }
        Ok(thesis)
    }

    pub fn get(&self, thesis_id: &str) -> Result<Thesis, DomainError> {
        self.repo
            .get(thesis_id)?
            .ok_or_else(|| DomainError::NotFound(format!("Thesis not found: {thesis_id}")))
    }

    pub fn list(&self, investor_id: &str, include_inactive: bool) -> Result<Vec<Thesis>, DomainError> {
        self.repo.list_for_investor(investor_id, include_inactive)
    }

    fn owned(&self, thesis_id: &str, investor_id: &str) -> Result<Thesis, DomainError> {
        let thesis = self.get(thesis_id)?;
        if thesis.investor_id != investor_id {
            return Err(DomainError::Forbidden(format!(
                "thesis {thesis_id} belongs to another investor"
            )));
        }
        Ok(thesis)
    }
}

fn validate_text(title: &str, description: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("title", "title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::validation(
            "title",
            format!("title cannot exceed {MAX_TITLE_LEN} characters"),
        ));
    }
    if description.trim().is_empty() {
        return Err(DomainError::validation("description", "description is required"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(DomainError::validation(
            "description",
            format!("description cannot exceed {MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    Ok(())
}

fn validate_criteria(c: &ThesisCriteria) -> Result<(), DomainError> {
    let thresholds = [
        ("criteria.min_revenue", c.min_revenue),
        ("criteria.min_growth_rate", c.min_growth_rate),
        ("criteria.max_burn_rate", c.max_burn_rate),
    ];
    for (field, value) in thresholds {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(DomainError::validation(field, "threshold must be a non-negative number"));
            }
        }
    }
    Ok(())
}
