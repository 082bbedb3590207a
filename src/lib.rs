pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::alert_engine::{AlertDecision, AlertEngine};
use crate::application::alerts::AlertsUseCase;
use crate::application::batch::{BatchOrchestrator, PipelineWorker};
use crate::application::deals::DealUseCase;
use crate::application::dispatch::{ChannelTarget, DispatchResult, NotificationDispatcher};
use crate::application::matching::{MatchUseCase, ThesisMatcher};
use crate::application::scoring::{ScoreComparison, ScoringUseCase};
use crate::application::theses::ThesisUseCase;
use crate::config::Config;
use crate::domain::entities::alert::Alert;
use crate::domain::entities::batch_job::{BatchJob, JobSpec};
use crate::domain::entities::composite_score::CompositeScore;
use crate::domain::entities::deal::Deal;
use crate::domain::entities::thesis::{Thesis, ThesisCriteria, ThesisUpdate};
use crate::domain::entities::thesis_match::ThesisMatch;
use crate::domain::error::DomainError;
use crate::domain::ports::alert_repository::{AlertFilter, AlertRepository};
use crate::domain::ports::deal_repository::DealRepository;
use crate::domain::ports::job_store::JobStore;
use crate::domain::ports::match_repository::MatchRepository;
use crate::domain::ports::notification_transport::NotificationTransport;
use crate::domain::ports::profile_repository::ProfileRepository;
use crate::domain::ports::score_repository::ScoreRepository;
use crate::domain::ports::scoring_oracle::ScoringOracle;
use crate::domain::ports::thesis_repository::ThesisRepository;
use crate::domain::values::alert_event::{default_rules, AlertEvent, TriggerRule};
use crate::domain::values::job_state::JobKind;
use crate::domain::values::sub_scores::SubScoreSet;
use crate::domain::values::weight_profile::{InvestorProfile, WeightProfile};
use crate::infrastructure::memory::job_store::InMemoryJobStore;
use crate::infrastructure::oracle::http::HttpScoringOracle;
use crate::infrastructure::oracle::unavailable::UnavailableOracle;
use crate::infrastructure::sqlite::alert_repo::SqliteAlertRepo;
use crate::infrastructure::sqlite::deal_repo::SqliteDealRepo;
use crate::infrastructure::sqlite::match_repo::SqliteMatchRepo;
use crate::infrastructure::sqlite::profile_repo::SqliteProfileRepo;
use crate::infrastructure::sqlite::score_repo::SqliteScoreRepo;
use crate::infrastructure::sqlite::thesis_repo::SqliteThesisRepo;
use crate::infrastructure::transports::email::EmailTransport;
use crate::infrastructure::transports::log::LogTransport;
use crate::infrastructure::transports::webhook::WebhookTransport;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub struct DealRank {
    deals_uc: DealUseCase,
    scoring_uc: Arc<ScoringUseCase>,
    match_uc: Arc<MatchUseCase>,
    thesis_uc: ThesisUseCase,
    alert_engine: Arc<AlertEngine>,
    alerts_uc: AlertsUseCase,
    batch: BatchOrchestrator,
    dispatcher: NotificationDispatcher,
}

impl DealRank {
    /// Builds the service from configuration: the HTTP oracle when a URL is
    /// set, the webhook and log transports, and email when SMTP is configured.
    pub fn new(config: &Config) -> Result<Self, DomainError> {
        let oracle: Arc<dyn ScoringOracle> = match &config.oracle_url {
            Some(url) => Arc::new(HttpScoringOracle::new(url)),
            None => Arc::new(UnavailableOracle),
        };
        let mut transports: Vec<Arc<dyn NotificationTransport>> = vec![
            Arc::new(WebhookTransport::new(config.webhook_url.clone())),
            Arc::new(LogTransport),
        ];
        if let Some(smtp) = &config.smtp {
            transports.push(Arc::new(EmailTransport::new(smtp)?));
        }
        Self::with_providers(config, oracle, transports)
    }

    pub fn with_providers(
        config: &Config,
        oracle: Arc<dyn ScoringOracle>,
        transports: Vec<Arc<dyn NotificationTransport>>,
    ) -> Result<Self, DomainError> {
        let conn = infrastructure::sqlite::open(&config.db_path)?;

        let deal_repo: Arc<dyn DealRepository> = Arc::new(SqliteDealRepo::new(conn.clone()));
        let profile_repo: Arc<dyn ProfileRepository> = Arc::new(SqliteProfileRepo::new(conn.clone()));
        let score_repo: Arc<dyn ScoreRepository> = Arc::new(SqliteScoreRepo::new(conn.clone()));
        let thesis_repo: Arc<dyn ThesisRepository> = Arc::new(SqliteThesisRepo::new(conn.clone()));
        let match_repo: Arc<dyn MatchRepository> = Arc::new(SqliteMatchRepo::new(conn.clone()));
        let alert_repo: Arc<dyn AlertRepository> = Arc::new(SqliteAlertRepo::new(conn));
        let job_store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

        let scoring_uc = Arc::new(ScoringUseCase::new(
            deal_repo.clone(),
            profile_repo,
            score_repo.clone(),
            oracle.clone(),
            config.oracle_timeout,
        ));
        let match_uc = Arc::new(MatchUseCase::new(
            thesis_repo.clone(),
            deal_repo.clone(),
            match_repo,
            oracle,
            ThesisMatcher::new(config.matching),
            config.oracle_timeout,
        ));
        let dedup_window = chrono::TimeDelta::try_hours(config.dedup_window_hours)
            .filter(|window| *window > chrono::TimeDelta::zero())
            .ok_or_else(|| {
                DomainError::Parse(format!(
                    "dedup window of {} hours is out of range",
                    config.dedup_window_hours
                ))
            })?;
        let alert_engine = Arc::new(AlertEngine::new(
            default_rules(config.match_alert_threshold),
            alert_repo.clone(),
            deal_repo.clone(),
            thesis_repo.clone(),
            score_repo,
            dedup_window,
        ));
        let worker = Arc::new(PipelineWorker::new(
            scoring_uc.clone(),
            match_uc.clone(),
            Some(alert_engine.clone()),
        ));

        Ok(Self {
            deals_uc: DealUseCase::new(deal_repo),
            scoring_uc,
            match_uc,
            thesis_uc: ThesisUseCase::new(thesis_repo),
            alert_engine,
            alerts_uc: AlertsUseCase::new(alert_repo),
            batch: BatchOrchestrator::new(job_store, worker, config.batch_concurrency),
            dispatcher: NotificationDispatcher::new(
                transports,
                config.transport_timeout,
                config.dispatch_concurrency,
            ),
        })
    }

    // Deals
    pub fn add_deal(&self, deal: Deal) -> Result<Deal, DomainError> {
        self.deals_uc.add(deal)
    }

    pub fn get_deal(&self, id: &str) -> Result<Deal, DomainError> {
        self.deals_uc.get(id)
    }

    pub fn list_deal_ids(&self) -> Result<Vec<String>, DomainError> {
        self.deals_uc.list_ids()
    }

    // Scoring
    pub fn weight_profile(&self, investor_id: &str) -> Result<WeightProfile, DomainError> {
        self.scoring_uc.weight_profile(investor_id)
    }

    pub fn set_weight_profile(
        &self,
        investor_id: &str,
        weights: WeightProfile,
    ) -> Result<InvestorProfile, DomainError> {
        self.scoring_uc.set_weight_profile(investor_id, weights)
    }

    pub fn aggregate(
        &self,
        deal_id: &str,
        investor_id: &str,
        sub_scores: &SubScoreSet,
    ) -> Result<CompositeScore, DomainError> {
        self.scoring_uc.aggregate(deal_id, investor_id, sub_scores)
    }

    pub async fn score_deal(&self, deal_id: &str, investor_id: &str) -> Result<CompositeScore, DomainError> {
        self.scoring_uc.score_deal(deal_id, investor_id).await
    }

    pub fn score_history(
        &self,
        deal_id: &str,
        investor_id: &str,
        limit: usize,
    ) -> Result<Vec<CompositeScore>, DomainError> {
        self.scoring_uc.history(deal_id, investor_id, limit)
    }

    pub fn current_score(&self, deal_id: &str, investor_id: &str) -> Result<Option<CompositeScore>, DomainError> {
        self.scoring_uc.current(deal_id, investor_id)
    }

    pub fn compare_scores(&self, deal_ids: &[String], investor_id: &str) -> Result<ScoreComparison, DomainError> {
        self.scoring_uc.compare(deal_ids, investor_id)
    }

    // Theses and matching
    pub fn create_thesis(
        &self,
        investor_id: &str,
        title: String,
        description: String,
        criteria: ThesisCriteria,
    ) -> Result<Thesis, DomainError> {
        self.thesis_uc.create(investor_id, title, description, criteria)
    }

    pub fn update_thesis(
        &self,
        thesis_id: &str,
        investor_id: &str,
        update: ThesisUpdate,
    ) -> Result<Thesis, DomainError> {
        self.thesis_uc.update(thesis_id, investor_id, update)
    }

    pub fn deactivate_thesis(&self, thesis_id: &str, investor_id: &str) -> Result<Thesis, DomainError> {
        self.thesis_uc.deactivate(thesis_id, investor_id)
    }

    pub fn get_thesis(&self, thesis_id: &str) -> Result<Thesis, DomainError> {
        self.thesis_uc.get(thesis_id)
    }

    pub fn list_theses(&self, investor_id: &str, include_inactive: bool) -> Result<Vec<Thesis>, DomainError> {
        self.thesis_uc.list(investor_id, include_inactive)
    }

    pub async fn match_deal(&self, thesis_id: &str, deal_id: &str) -> Result<ThesisMatch, DomainError> {
        self.match_uc.match_deal(thesis_id, deal_id).await
    }

    pub fn top_matches(
        &self,
        thesis_id: &str,
        min_score: f64,
        limit: usize,
    ) -> Result<Vec<ThesisMatch>, DomainError> {
        self.match_uc.top_matches(thesis_id, min_score, limit)
    }

    pub fn matches_for_investor(
        &self,
        investor_id: &str,
        min_score: f64,
        limit: usize,
    ) -> Result<BTreeMap<String, Vec<ThesisMatch>>, DomainError> {
        self.match_uc.matches_for_investor(investor_id, min_score, limit)
    }

    // Batch jobs
    pub async fn submit_batch_job(&self, spec: JobSpec) -> Result<String, DomainError> {
        self.batch.submit(spec).await
    }

    /// Re-scores every known deal for `investor_id`.
    pub async fn recalculate_all(&self, investor_id: &str) -> Result<String, DomainError> {
        let target_ids = self.deals_uc.list_ids()?;
        self.batch
            .submit(JobSpec {
                kind: JobKind::Recalculate,
                investor_id: investor_id.to_string(),
                thesis_id: None,
                target_ids,
            })
            .await
    }

    pub fn job_status(&self, job_id: &str) -> Result<BatchJob, DomainError> {
        self.batch.status(job_id)
    }

    pub fn cancel_job(&self, job_id: &str, investor_id: &str) -> Result<BatchJob, DomainError> {
        self.batch.cancel(job_id, investor_id)
    }

    pub fn list_jobs(&self, investor_id: Option<&str>) -> Result<Vec<BatchJob>, DomainError> {
        self.batch.list_jobs(investor_id)
    }

    pub fn remove_job(&self, job_id: &str) -> Result<BatchJob, DomainError> {
        self.batch.remove_job(job_id)
    }

    pub async fn wait_for_job(&self, job_id: &str, poll: Duration) -> Result<BatchJob, DomainError> {
        self.batch.wait(job_id, poll).await
    }

    // Alerts
    pub fn alert_rules(&self) -> &[TriggerRule] {
        self.alert_engine.rules()
    }

    pub fn evaluate_alert(&self, event: &AlertEvent) -> Result<Vec<AlertDecision>, DomainError> {
        self.alert_engine.evaluate(event)
    }

    pub fn list_alerts(&self, investor_id: &str, filter: &AlertFilter) -> Result<Vec<Alert>, DomainError> {
        self.alerts_uc.list(investor_id, filter)
    }

    pub fn get_alert(&self, alert_id: &str) -> Result<Alert, DomainError> {
        self.alerts_uc.get(alert_id)
    }

    pub fn mark_alert_read(&self, alert_id: &str, investor_id: &str) -> Result<Alert, DomainError> {
        self.alerts_uc.mark_read(alert_id, investor_id)
    }

    pub fn archive_alert(&self, alert_id: &str, investor_id: &str) -> Result<Alert, DomainError> {
        self.alerts_uc.archive(alert_id, investor_id)
    }

    pub fn archive_expired_alerts(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        self.alerts_uc.archive_expired(now)
    }

    // Notifications
    pub fn notification_channels(&self) -> Vec<String> {
        self.dispatcher.channels()
    }

    pub async fn dispatch_notification(
        &self,
        alert_id: &str,
        targets: &[ChannelTarget],
    ) -> Result<DispatchResult, DomainError> {
        let alert = self.alerts_uc.get(alert_id)?;
        Ok(self.dispatcher.dispatch(&alert, targets).await)
    }

    pub async fn redispatch_failed(
        &self,
        alert_id: &str,
        previous: &DispatchResult,
    ) -> Result<DispatchResult, DomainError> {
        if previous.alert_id != alert_id {
            return Err(DomainError::validation(
                "previous",
                "dispatch result belongs to a different alert",
            ));
        }
        let alert = self.alerts_uc.get(alert_id)?;
        Ok(self.dispatcher.redispatch_failed(&alert, previous).await)
    }
}
