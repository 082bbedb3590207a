use crate::domain::entities::thesis::Thesis;
use crate::domain::error::DomainError;

pub trait ThesisRepository: Send + Sync {
    fn add(&self, thesis: &Thesis) -> Result<(), DomainError>;
    fn get(&self, id: &str) -> Result<Option<Thesis>, DomainError>;
    /// Replaces the stored row in one write.
    fn replace(&self, thesis: &Thesis) -> Result<(), DomainError>;
    fn list_for_investor(
        &self,
        investor_id: &str,
        include_inactive: bool,
    ) -> Result<Vec<Thesis>, DomainError>;
}
