use crate::domain::entities::batch_job::BatchJob;
use crate::domain::error::DomainError;
use crate::domain::ports::job_store::JobStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local job registry. Jobs stay until explicitly removed.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, BatchJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> DomainError {
    DomainError::Database(format!("job store lock poisoned: {e}"))
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: BatchJob) -> Result<(), DomainError> {
        let mut jobs = self.jobs.write().map_err(poisoned)?;
        if jobs.contains_key(&job.id) {
            return Err(DomainError::Conflict(format!("Job already exists: {}", job.id)));
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<BatchJob>, DomainError> {
        let jobs = self.jobs.read().map_err(poisoned)?;
        Ok(jobs.get(id).cloned())
    }

    fn update(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut BatchJob),
    ) -> Result<BatchJob, DomainError> {
        let mut jobs = self.jobs.write().map_err(poisoned)?;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Job not found: {id}")))?;
        apply(job);
        Ok(job.clone())
    }

    fn list(&self, investor_id: Option<&str>) -> Result<Vec<BatchJob>, DomainError> {
        let jobs = self.jobs.read().map_err(poisoned)?;
        let mut out: Vec<BatchJob> = jobs
            .values()
            .filter(|j| investor_id.map_or(true, |inv| j.investor_id == inv))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    fn remove(&self, id: &str) -> Result<Option<BatchJob>, DomainError> {
        let mut jobs = self.jobs.write().map_err(poisoned)?;
        Ok(jobs.remove(id))
    }
}
