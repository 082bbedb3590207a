//! Runtime configuration read from `DEALRANK_*` environment variables.

use crate::domain::error::DomainError;
use std::str::FromStr;
use std::time::Duration;

/// Longest accepted alert dedup window: one year.
pub const MAX_DEDUP_WINDOW_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// Base URL of the ML scoring service. `None` disables oracle calls.
    pub oracle_url: Option<String>,
    pub oracle_timeout: Duration,
    pub transport_timeout: Duration,
    pub batch_concurrency: usize,
    pub dispatch_concurrency: usize,
    pub dedup_window_hours: i64,
    pub matching: MatchConfig,
    /// Match score at or above which a thesis-match alert fires.
    pub match_alert_threshold: f64,
    pub webhook_url: Option<String>,
    /// SMTP relay for the email channel. `None` leaves email unregistered.
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender mailbox, e.g. `DealRank <alerts@fund.example>`.
    pub from: String,
}

/// Blend between criteria coverage and semantic similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    pub criteria_weight: f64,
    pub semantic_weight: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            criteria_weight: 0.6,
            semantic_weight: 0.4,
        }
    }
}

impl MatchConfig {
    pub fn new(criteria_weight: f64) -> Result<Self, DomainError> {
        if !(0.0..=1.0).contains(&criteria_weight) {
            return Err(DomainError::validation(
                "match.criteria_weight",
                format!("must be within 0.0-1.0, got {criteria_weight}"),
            ));
        }
        Ok(Self {
            criteria_weight,
            semantic_weight: 1.0 - criteria_weight,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./dealrank.db".into(),
            oracle_url: None,
            oracle_timeout: Duration::from_secs(60),
            transport_timeout: Duration::from_secs(60),
            batch_concurrency: 5,
            dispatch_concurrency: 4,
            dedup_window_hours: 24,
            matching: MatchConfig::default(),
            match_alert_threshold: 75.0,
            webhook_url: None,
            smtp: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let defaults = Config::default();
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let criteria_weight = parsed(&lookup, "DEALRANK_MATCH_CRITERIA_WEIGHT")?
            .unwrap_or(defaults.matching.criteria_weight);

        let smtp = match text("DEALRANK_SMTP_HOST") {
            Some(host) => {
                let username = text("DEALRANK_SMTP_USER");
                let from = text("DEALRANK_SMTP_FROM")
                    .or_else(|| username.clone())
                    .ok_or_else(|| {
                        DomainError::Parse(
                            "DEALRANK_SMTP_FROM or DEALRANK_SMTP_USER is required with DEALRANK_SMTP_HOST".into(),
                        )
                    })?;
                Some(SmtpConfig {
                    host,
                    port: parsed(&lookup, "DEALRANK_SMTP_PORT")?.unwrap_or(587),
                    username,
                    password: text("DEALRANK_SMTP_PASS"),
                    from,
                })
            }
            None => None,
        };

        let config = Config {
            db_path: text("DEALRANK_DB").unwrap_or(defaults.db_path),
            oracle_url: text("DEALRANK_ORACLE_URL"),
            oracle_timeout: parsed(&lookup, "DEALRANK_ORACLE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.oracle_timeout),
            transport_timeout: parsed(&lookup, "DEALRANK_TRANSPORT_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.transport_timeout),
            batch_concurrency: parsed(&lookup, "DEALRANK_BATCH_CONCURRENCY")?
                .unwrap_or(defaults.batch_concurrency),
            dispatch_concurrency: parsed(&lookup, "DEALRANK_DISPATCH_CONCURRENCY")?
                .unwrap_or(defaults.dispatch_concurrency),
            dedup_window_hours: parsed(&lookup, "DEALRANK_DEDUP_WINDOW_HOURS")?
                .unwrap_or(defaults.dedup_window_hours),
            matching: MatchConfig::new(criteria_weight)?,
            match_alert_threshold: parsed(&lookup, "DEALRANK_MATCH_ALERT_THRESHOLD")?
                .unwrap_or(defaults.match_alert_threshold),
            webhook_url: text("DEALRANK_WEBHOOK_URL"),
            smtp,
        };

        if config.batch_concurrency == 0 {
            return Err(DomainError::Parse(
                "DEALRANK_BATCH_CONCURRENCY must be at least 1".into(),
            ));
        }
        if config.dispatch_concurrency == 0 {
            return Err(DomainError::Parse(
                "DEALRANK_DISPATCH_CONCURRENCY must be at least 1".into(),
            ));
        }
        if !(1..=MAX_DEDUP_WINDOW_HOURS).contains(&config.dedup_window_hours) {
            return Err(DomainError::Parse(format!(
                "DEALRANK_DEDUP_WINDOW_HOURS must be within 1-{MAX_DEDUP_WINDOW_HOURS}, got {}",
                config.dedup_window_hours
            )));
        }
        if !config.match_alert_threshold.is_finite()
            || !(0.0..=100.0).contains(&config.match_alert_threshold)
        {
            return Err(DomainError::Parse(format!(
                "DEALRANK_MATCH_ALERT_THRESHOLD must be within 0-100, got {}",
                config.match_alert_threshold
            )));
        }
        Ok(config)
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, DomainError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| DomainError::Parse(format!("{key}={raw}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.oracle_timeout, Duration::from_secs(60));
        assert_eq!(config.dedup_window_hours, 24);
        assert_eq!(config.batch_concurrency, 5);
        assert!(config.oracle_url.is_none());
        assert!((config.matching.criteria_weight - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DEALRANK_DB", "/tmp/x.db"),
            ("DEALRANK_ORACLE_TIMEOUT_SECS", "5"),
            ("DEALRANK_MATCH_CRITERIA_WEIGHT", "0.7"),
            ("DEALRANK_ORACLE_URL", "http://ml:8000"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, "/tmp/x.db");
        assert_eq!(config.oracle_timeout, Duration::from_secs(5));
        assert!((config.matching.semantic_weight - 0.3).abs() < 1e-9);
        assert_eq!(config.oracle_url.as_deref(), Some("http://ml:8000"));
    }

    #[test]
    fn test_malformed_value_is_parse_error() {
        let err = Config::from_lookup(lookup(&[("DEALRANK_BATCH_CONCURRENCY", "many")])).unwrap_err();
        assert!(matches!(err, DomainError::Parse(_)));
    }

    #[test]
    fn test_dedup_window_bounds() {
        for raw in ["-24", "0", "9000000000000000"] {
            let err = Config::from_lookup(lookup(&[("DEALRANK_DEDUP_WINDOW_HOURS", raw)])).unwrap_err();
            assert!(matches!(err, DomainError::Parse(_)), "{raw} accepted");
        }
        let config = Config::from_lookup(lookup(&[("DEALRANK_DEDUP_WINDOW_HOURS", "1")])).unwrap();
        assert_eq!(config.dedup_window_hours, 1);
    }

    #[test]
    fn test_match_alert_threshold_must_be_a_score() {
        for raw in ["NaN", "inf", "-1", "100.5"] {
            assert!(
                Config::from_lookup(lookup(&[("DEALRANK_MATCH_ALERT_THRESHOLD", raw)])).is_err(),
                "{raw} accepted"
            );
        }
        let config = Config::from_lookup(lookup(&[("DEALRANK_MATCH_ALERT_THRESHOLD", "90")])).unwrap();
        assert_eq!(config.match_alert_threshold, 90.0);
    }

    #[test]
    fn test_smtp_section_only_with_host() {
        assert!(Config::from_lookup(lookup(&[])).unwrap().smtp.is_none());

        let config = Config::from_lookup(lookup(&[
            ("DEALRANK_SMTP_HOST", "smtp.fund.example"),
            ("DEALRANK_SMTP_USER", "alerts@fund.example"),
            ("DEALRANK_SMTP_PASS", "secret"),
        ]))
        .unwrap();
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.from, "alerts@fund.example");
        assert_eq!(smtp.password.as_deref(), Some("secret"));

        let err = Config::from_lookup(lookup(&[("DEALRANK_SMTP_HOST", "smtp.fund.example")])).unwrap_err();
        assert!(matches!(err, DomainError::Parse(_)));
    }

    #[test]
    fn test_blend_out_of_range_rejected() {
        assert!(Config::from_lookup(lookup(&[("DEALRANK_MATCH_CRITERIA_WEIGHT", "1.5")])).is_err());
    }
}
