//! Batch job orchestration.
//!
//! A submitted job runs on its own task. Items are spawned into a `JoinSet`
//! behind a semaphore, and every item records its outcome through
//! [`JobStore::update`], so progress updates for one job are serialized.

use crate::application::alert_engine::AlertEngine;
use crate::application::matching::MatchUseCase;
use crate::application::scoring::ScoringUseCase;
use crate::domain::entities::batch_job::{BatchJob, ItemOutput, ItemStatus, JobSpec, CANCELLED_REASON};
use crate::domain::error::DomainError;
use crate::domain::ports::job_store::JobStore;
use crate::domain::values::alert_event::AlertEvent;
use crate::domain::values::job_state::JobKind;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Does the work for one job kind.
#[async_trait]
pub trait JobWorker: Send + Sync {
    /// Runs once before any item. An error here fails the whole job.
    async fn prepare(&self, spec: &JobSpec) -> Result<(), DomainError>;

    /// Processes one target. An error is recorded against that item only.
    async fn run_item(&self, spec: &JobSpec, target_id: &str) -> Result<ItemOutput, DomainError>;
}

/// Worker backed by the scoring and matching use cases.
pub struct PipelineWorker {
    scoring: Arc<ScoringUseCase>,
    matching: Arc<MatchUseCase>,
    alerts: Option<Arc<AlertEngine>>,
}

impl PipelineWorker {
    pub fn new(
        scoring: Arc<ScoringUseCase>,
        matching: Arc<MatchUseCase>,
        alerts: Option<Arc<AlertEngine>>,
    ) -> Self {
        Self {
            scoring,
            matching,
            alerts,
        }
    }

    async fn score_item(&self, spec: &JobSpec, deal_id: &str) -> Result<ItemOutput, DomainError> {
        let score = self.scoring.score_deal(deal_id, &spec.investor_id).await?;
        let mut alerts_created = 0;
        if let Some(engine) = &self.alerts {
            match engine.evaluate(&AlertEvent::Score(score.clone())) {
                Ok(decisions) => {
                    alerts_created = decisions.iter().filter(|d| d.created().is_some()).count();
                }
                Err(e) => {
                    warn!(deal_id, error = %e, "alert evaluation failed for scored deal");
                }
            }
        }
        Ok(ItemOutput::Score {
            value: score.value,
            tier: score.tier,
            alerts_created,
        })
    }
}

#[async_trait]
impl JobWorker for PipelineWorker {
    async fn prepare(&self, spec: &JobSpec) -> Result<(), DomainError> {
        if spec.kind == JobKind::Match {
            let thesis_id = thesis_of(spec)?;
            self.matching.active_thesis(thesis_id)?;
        }
        Ok(())
    }

    async fn run_item(&self, spec: &JobSpec, target_id: &str) -> Result<ItemOutput, DomainError> {
        match spec.kind {
            JobKind::Score | JobKind::Recalculate => self.score_item(spec, target_id).await,
            JobKind::Match => {
                // Reloads the thesis per item so a mid-job deactivation fails later items.
                let m = self.matching.match_deal(thesis_of(spec)?, target_id).await?;
                Ok(ItemOutput::Match {
                    match_score: m.match_score,
                    vetoed: m.is_vetoed(),
                })
            }
        }
    }
}

fn thesis_of(spec: &JobSpec) -> Result<&str, DomainError> {
    spec.thesis_id
        .as_deref()
        .ok_or_else(|| DomainError::validation("thesis_id", "match jobs require a thesis id"))
}

type CancelFlags = Arc<Mutex<HashMap<String, Arc<AtomicBool>>>>;

pub struct BatchOrchestrator {
    store: Arc<dyn JobStore>,
    worker: Arc<dyn JobWorker>,
    concurrency: usize,
    cancel_flags: CancelFlags,
}

impl BatchOrchestrator {
    pub fn new(store: Arc<dyn JobStore>, worker: Arc<dyn JobWorker>, concurrency: usize) -> Self {
        Self {
            store,
            worker,
            concurrency: concurrency.max(1),
            cancel_flags: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers the job and starts it in the background. Must be called
    /// from within a tokio runtime.
    pub async fn submit(&self, spec: JobSpec) -> Result<String, DomainError> {
        if spec.investor_id.trim().is_empty() {
            return Err(DomainError::validation("investor_id", "investor id is required"));
        }
        if spec.target_ids.is_empty() {
            return Err(DomainError::validation("target_ids", "at least one target is required"));
        }
        if spec.kind == JobKind::Match {
            thesis_of(&spec)?;
        }

        let job = BatchJob::new(&spec);
        let job_id = job.id.clone();
        self.store.insert(job)?;

        let flag = Arc::new(AtomicBool::new(false));
        self.cancel_flags
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(job_id.clone(), flag.clone());

        info!(job_id = %job_id, kind = %spec.kind, items = spec.target_ids.len(), "batch job submitted");

        let run = JobRun {
            store: self.store.clone(),
            worker: self.worker.clone(),
            concurrency: self.concurrency,
            cancel: flag,
            job_id: job_id.clone(),
        };
        let flags = self.cancel_flags.clone();
        tokio::spawn(async move {
            let job_id = run.job_id.clone();
            run.execute(spec).await;
            if let Ok(mut flags) = flags.lock() {
                flags.remove(&job_id);
            }
        });

        Ok(job_id)
    }

    pub fn status(&self, job_id: &str) -> Result<BatchJob, DomainError> {
        self.store
            .get(job_id)?
            .ok_or_else(|| DomainError::NotFound(format!("Job not found: {job_id}")))
    }

    pub fn list_jobs(&self, investor_id: Option<&str>) -> Result<Vec<BatchJob>, DomainError> {
        self.store.list(investor_id)
    }

    /// Drops a finished job from the registry.
    pub fn remove_job(&self, job_id: &str) -> Result<BatchJob, DomainError> {
        let job = self.status(job_id)?;
        if !job.state.is_terminal() {
            return Err(DomainError::Conflict(format!(
                "job {job_id} is still {}",
                job.state
            )));
        }
        self.store
            .remove(job_id)?
            .ok_or_else(|| DomainError::NotFound(format!("Job not found: {job_id}")))
    }

    /// Stops a running job. In-flight items finish; unstarted items are
    /// skipped and the job fails with [`CANCELLED_REASON`].
    pub fn cancel(&self, job_id: &str, investor_id: &str) -> Result<BatchJob, DomainError> {
        let job = self.status(job_id)?;
        if job.investor_id != investor_id {
            return Err(DomainError::Forbidden(format!(
                "job {job_id} belongs to another investor"
            )));
        }
        if job.state.is_terminal() {
            return Err(DomainError::Conflict(format!(
                "job {job_id} is already {}",
                job.state
            )));
        }

        let job = self.store.update(job_id, &mut |j| j.cancel_requested = true)?;
        if let Some(flag) = self
            .cancel_flags
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(job_id)
        {
            flag.store(true, Ordering::SeqCst);
        }
        info!(job_id, "batch job cancellation requested");
        Ok(job)
    }

    /// Polls until the job is terminal.
    pub async fn wait(&self, job_id: &str, poll: Duration) -> Result<BatchJob, DomainError> {
        loop {
            let job = self.status(job_id)?;
            if job.state.is_terminal() {
                return Ok(job);
            }
            tokio::time::sleep(poll).await;
        }
    }
}

/// Everything one running job needs, moved onto its task.
struct JobRun {
    store: Arc<dyn JobStore>,
    worker: Arc<dyn JobWorker>,
    concurrency: usize,
    cancel: Arc<AtomicBool>,
    job_id: String,
}

impl JobRun {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    async fn execute(self, spec: JobSpec) {
        let job_id = self.job_id.clone();
        if let Err(e) = self.store.update(&job_id, &mut |j| j.start()) {
            error!(job_id = %job_id, error = %e, "could not start batch job");
            return;
        }

        if let Err(e) = self.worker.prepare(&spec).await {
            warn!(job_id = %job_id, error = %e, "batch job preparation failed");
            self.finish(Some(e.to_string()));
            return;
        }

        let spec = Arc::new(spec);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut task_index = HashMap::new();

        for (index, target_id) in spec.target_ids.iter().cloned().enumerate() {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            if self.cancelled() {
                debug!(job_id = %job_id, index, "cancellation observed, no new items start");
                break;
            }

            let store = self.store.clone();
            let worker = self.worker.clone();
            let spec = spec.clone();
            let job_id = job_id.clone();
            let handle = tasks.spawn(async move {
                let _permit = permit;
                let status = match worker.run_item(&spec, &target_id).await {
                    Ok(output) => ItemStatus::Succeeded { output },
                    Err(e) => {
                        warn!(job_id = %job_id, target_id = %target_id, error = %e, "batch item failed");
                        ItemStatus::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                store.update(&job_id, &mut |j| j.record_item(index, status.clone()))
            });
            task_index.insert(handle.id(), index);
        }

        let mut infrastructure_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    infrastructure_error.get_or_insert(e.to_string());
                }
                Err(e) => {
                    let Some(&index) = task_index.get(&e.id()) else {
                        continue;
                    };
                    let status = ItemStatus::Failed {
                        reason: format!("item task aborted: {e}"),
                    };
                    if let Err(store_err) = self
                        .store
                        .update(&job_id, &mut |j| j.record_item(index, status.clone()))
                    {
                        infrastructure_error.get_or_insert(store_err.to_string());
                    }
                }
            }
        }

        self.finish(infrastructure_error);
    }

    /// Moves a job that is not yet terminal to failed, picking the reason.
    fn finish(&self, error: Option<String>) {
        let cancelled = self.cancelled();
        let outcome = self.store.update(&self.job_id, &mut |j| {
            if j.state.is_terminal() {
                return;
            }
            match &error {
                Some(reason) => j.fail(reason.clone()),
                None if cancelled || j.cancel_requested => j.fail(CANCELLED_REASON),
                None => j.fail("job stopped with unprocessed items"),
            }
        });

        match outcome {
            Ok(job) => info!(
                job_id = %job.id,
                state = %job.state,
                succeeded = job.succeeded_count(),
                failed = job.failed_count(),
                "batch job finished"
            ),
            Err(e) => error!(job_id = %self.job_id, error = %e, "could not finalize batch job"),
        }
    }
}
