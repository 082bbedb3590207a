use crate::domain::entities::deal::Deal;
use crate::domain::error::DomainError;

pub trait DealRepository: Send + Sync {
    fn add(&self, deal: &Deal) -> Result<(), DomainError>;
    fn get(&self, id: &str) -> Result<Option<Deal>, DomainError>;
    fn list_ids(&self) -> Result<Vec<String>, DomainError>;
}
