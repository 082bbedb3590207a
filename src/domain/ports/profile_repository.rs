use crate::domain::error::DomainError;
use crate::domain::values::weight_profile::InvestorProfile;

/// Weight profiles are replaced whole; readers never observe a partial write.
pub trait ProfileRepository: Send + Sync {
    fn get(&self, investor_id: &str) -> Result<Option<InvestorProfile>, DomainError>;
    fn put(&self, profile: &InvestorProfile) -> Result<(), DomainError>;
}
