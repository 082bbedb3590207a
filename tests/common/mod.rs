//! Shared test helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use dealrank::config::Config;
use dealrank::domain::entities::deal::Deal;
use dealrank::domain::error::DomainError;
use dealrank::domain::ports::notification_transport::{NotificationPayload, NotificationTransport};
use dealrank::domain::ports::scoring_oracle::ScoringOracle;
use dealrank::domain::values::sub_scores::SubScoreSet;
use dealrank::DealRank;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scoring oracle keyed by deal name.
pub struct MockOracle {
    pub sub_scores: HashMap<String, SubScoreSet>,
    pub default_scores: SubScoreSet,
    pub failing: HashSet<String>,
    pub semantic: Option<f64>,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self {
            sub_scores: HashMap::new(),
            default_scores: SubScoreSet::new(70.0, 70.0, 70.0, 70.0),
            failing: HashSet::new(),
            semantic: Some(50.0),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }
}

impl MockOracle {
    pub fn failing_for(mut self, deal_name: &str) -> Self {
        self.failing.insert(deal_name.to_string());
        self
    }

    pub fn with_scores(mut self, deal_name: &str, scores: SubScoreSet) -> Self {
        self.sub_scores.insert(deal_name.to_string(), scores);
        self
    }

    pub fn with_semantic(mut self, semantic: Option<f64>) -> Self {
        self.semantic = semantic;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ScoringOracle for MockOracle {
    async fn compute_sub_scores(&self, deal: &Deal) -> Result<SubScoreSet, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.contains(&deal.name) {
            return Err(DomainError::ExternalService(format!(
                "oracle unavailable for {}",
                deal.name
            )));
        }
        Ok(self
            .sub_scores
            .get(&deal.name)
            .cloned()
            .unwrap_or_else(|| self.default_scores.clone()))
    }

    async fn compute_semantic_similarity(
        &self,
        _pitch_text: &str,
        _thesis_text: &str,
    ) -> Result<f64, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.semantic
            .ok_or_else(|| DomainError::ExternalService("semantic service down".into()))
    }

    fn name(&self) -> &str {
        "mock-oracle"
    }
}

/// Records every send; fails its first `failures` sends.
pub struct MockTransport {
    pub channel: String,
    pub failures: AtomicUsize,
    pub delay: Duration,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            failures: AtomicUsize::new(0),
            delay: Duration::ZERO,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(channel: &str, failures: usize) -> Self {
        let t = Self::new(channel);
        t.failures.store(failures, Ordering::SeqCst);
        t
    }

    pub fn slow(channel: &str, delay: Duration) -> Self {
        let mut t = Self::new(channel);
        t.delay = delay;
        t
    }

    pub fn sent_keys(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, key)| key.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationTransport for MockTransport {
    fn channel(&self) -> &str {
        &self.channel
    }

    async fn send(&self, recipient: &str, payload: &NotificationPayload) -> Result<(), DomainError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(DomainError::ExternalService(format!(
                "{} rejected the message",
                self.channel
            )));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), payload.idempotency_key.clone()));
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        db_path: ":memory:".into(),
        ..Config::default()
    }
}

pub fn setup() -> DealRank {
    setup_with(MockOracle::default(), vec![])
}

pub fn setup_with(oracle: MockOracle, transports: Vec<Arc<dyn NotificationTransport>>) -> DealRank {
    setup_with_config(test_config(), Arc::new(oracle), transports)
}

pub fn setup_with_config(
    config: Config,
    oracle: Arc<dyn ScoringOracle>,
    transports: Vec<Arc<dyn NotificationTransport>>,
) -> DealRank {
    DealRank::with_providers(&config, oracle, transports).unwrap()
}

pub fn make_deal(name: &str, sectors: &[&str], stage: &str, country: &str) -> Deal {
    let mut deal = Deal::new(
        name.to_string(),
        sectors.iter().map(|s| s.to_string()).collect(),
        stage.to_string(),
        country.to_string(),
    );
    deal.description = format!("{name} builds software for {}", sectors.join(" and "));
    deal
}

pub fn add_deal(app: &DealRank, name: &str) -> Deal {
    app.add_deal(make_deal(name, &["fintech"], "seed", "US")).unwrap()
}
