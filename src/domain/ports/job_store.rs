use crate::domain::entities::batch_job::BatchJob;
use crate::domain::error::DomainError;

/// Registry of batch jobs, injected into the orchestrator.
pub trait JobStore: Send + Sync {
    fn insert(&self, job: BatchJob) -> Result<(), DomainError>;
    /// Consistent snapshot of one job.
    fn get(&self, id: &str) -> Result<Option<BatchJob>, DomainError>;
    /// Applies `apply` under the job's write lock and returns the new snapshot.
    fn update(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut BatchJob),
    ) -> Result<BatchJob, DomainError>;
    fn list(&self, investor_id: Option<&str>) -> Result<Vec<BatchJob>, DomainError>;
    fn remove(&self, id: &str) -> Result<Option<BatchJob>, DomainError>;
}
