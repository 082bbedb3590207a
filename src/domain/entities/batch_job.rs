//! Batch job record and its state machine.
//!
//! `waiting → active → {completed, failed}`. The job completes in the same
//! update that records its last item, so `progress == 100` exactly when the
//! state is `completed`. Items failing individually never fail the job.

use crate::domain::values::job_state::{JobKind, JobState};
use crate::domain::values::recommendation::RecommendationTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CANCELLED_REASON: &str = "cancelled by owner";

/// What a caller asks the orchestrator to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub kind: JobKind,
    pub investor_id: String,
    /// Required for `match` jobs.
    pub thesis_id: Option<String>,
    pub target_ids: Vec<String>,
}

/// Successful output of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemOutput {
    Score {
        value: u8,
        tier: RecommendationTier,
        alerts_created: usize,
    },
    Match {
        match_score: f64,
        vetoed: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Succeeded { output: ItemOutput },
    Failed { reason: String },
    /// Never started because the job was cancelled.
    Skipped,
}

impl ItemStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, ItemStatus::Succeeded { .. } | ItemStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobItem {
    pub target_id: String,
    #[serde(flatten)]
    pub status: ItemStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub id: String,
    pub kind: JobKind,
    pub investor_id: String,
    pub thesis_id: Option<String>,
    pub state: JobState,
    pub progress: u8,
    pub items: Vec<JobItem>,
    pub cancel_requested: bool,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchJob {
    pub fn new(spec: &JobSpec) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: spec.kind,
            investor_id: spec.investor_id.clone(),
            thesis_id: spec.thesis_id.clone(),
            state: JobState::Waiting,
            progress: 0,
            items: spec
                .target_ids
                .iter()
                .map(|id| JobItem {
                    target_id: id.clone(),
                    status: ItemStatus::Pending,
                })
                .collect(),
            cancel_requested: false,
            failure_reason: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn finished_count(&self) -> usize {
        self.items.iter().filter(|i| i.status.is_finished()).count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Succeeded { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Failed { .. }))
            .count()
    }

    pub fn start(&mut self) {
        if self.state == JobState::Waiting {
            self.state = JobState::Active;
            self.started_at = Some(Utc::now());
        }
    }

    /// Records one item's outcome. Ignored once the job is terminal or the
    /// item already has an outcome.
    pub fn record_item(&mut self, index: usize, status: ItemStatus) {
        if self.state != JobState::Active {
            return;
        }
        let Some(item) = self.items.get_mut(index) else {
            return;
        };
        if item.status.is_finished() {
            return;
        }
        item.status = status;

        let total = self.items.len();
        let finished = self.finished_count();
        let progress = ((finished * 100) / total) as u8;
        self.progress = self.progress.max(progress);

        if finished == total {
            self.state = JobState::Completed;
            self.progress = 100;
            self.finished_at = Some(Utc::now());
        }
    }

    /// Fatal stop. Unstarted items are marked skipped; finished items keep
    /// their outcome and progress is left where it was.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.state.is_terminal() {
            return;
        }
        for item in &mut self.items {
            if item.status == ItemStatus::Pending {
                item.status = ItemStatus::Skipped;
            }
        }
        self.state = JobState::Failed;
        self.failure_reason = Some(reason.into());
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(n: usize) -> BatchJob {
        BatchJob::new(&JobSpec {
            kind: JobKind::Score,
            investor_id: "inv".into(),
            thesis_id: None,
            target_ids: (0..n).map(|i| format!("deal-{i}")).collect(),
        })
    }

    fn ok() -> ItemStatus {
        ItemStatus::Succeeded {
            output: ItemOutput::Score {
                value: 70,
                tier: RecommendationTier::Consider,
                alerts_created: 0,
            },
        }
    }

    #[test]
    fn test_new_job_is_waiting() {
        let j = job(3);
        assert_eq!(j.state, JobState::Waiting);
        assert_eq!(j.progress, 0);
        assert_eq!(j.items.len(), 3);
    }

    #[test]
    fn test_records_ignored_before_start() {
        let mut j = job(1);
        j.record_item(0, ok());
        assert_eq!(j.state, JobState::Waiting);
        assert_eq!(j.items[0].status, ItemStatus::Pending);
    }

    #[test]
    fn test_progress_hits_100_only_on_completion() {
        let mut j = job(3);
        j.start();
        j.record_item(2, ok());
        assert_eq!(j.progress, 33);
        assert_eq!(j.state, JobState::Active);
        j.record_item(
            0,
            ItemStatus::Failed {
                reason: "oracle down".into(),
            },
        );
        assert_eq!(j.progress, 66);
        assert_eq!(j.state, JobState::Active);
        j.record_item(1, ok());
        assert_eq!(j.progress, 100);
        assert_eq!(j.state, JobState::Completed);
        assert_eq!(j.succeeded_count(), 2);
        assert_eq!(j.failed_count(), 1);
    }

    #[test]
    fn test_duplicate_record_does_not_advance() {
        let mut j = job(2);
        j.start();
        j.record_item(0, ok());
        j.record_item(0, ok());
        assert_eq!(j.progress, 50);
        assert_eq!(j.state, JobState::Active);
    }

    #[test]
    fn test_fail_skips_pending_items() {
        let mut j = job(3);
        j.start();
        j.record_item(0, ok());
        j.fail(CANCELLED_REASON);
        assert_eq!(j.state, JobState::Failed);
        assert_eq!(j.progress, 33);
        assert_eq!(j.items[1].status, ItemStatus::Skipped);
        assert_eq!(j.failure_reason.as_deref(), Some(CANCELLED_REASON));

        // terminal: later records are dropped
        j.record_item(1, ok());
        assert_eq!(j.items[1].status, ItemStatus::Skipped);
    }
}
