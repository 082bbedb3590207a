//! Fans one alert out to several channels and reports each outcome.
//!
//! Channels run as separate tasks bounded by a semaphore and are joined
//! before returning. A failed, timed-out or panicking channel only affects
//! its own entry in the [`DispatchResult`]. Nothing is retried here;
//! [`NotificationDispatcher::redispatch_failed`] is the explicit retry.

use crate::application::external::with_timeout;
use crate::domain::entities::alert::Alert;
use crate::domain::ports::notification_transport::{NotificationPayload, NotificationTransport};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// One delivery address: a registered channel name and a recipient on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelTarget {
    pub channel: String,
    pub recipient: String,
}

impl ChannelTarget {
    pub fn new(channel: &str, recipient: &str) -> Self {
        Self {
            channel: channel.to_string(),
            recipient: recipient.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelOutcome {
    pub target: ChannelTarget,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    pub alert_id: String,
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchResult {
    pub fn all_delivered(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == DeliveryStatus::Delivered)
    }

    pub fn failed_targets(&self) -> Vec<ChannelTarget> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, DeliveryStatus::Failed { .. }))
            .map(|o| o.target.clone())
            .collect()
    }

    pub fn outcome(&self, channel: &str) -> Option<&DeliveryStatus> {
        self.outcomes
            .iter()
            .find(|o| o.target.channel == channel)
            .map(|o| &o.status)
    }
}

pub struct NotificationDispatcher {
    transports: HashMap<String, Arc<dyn NotificationTransport>>,
    timeout: Duration,
    concurrency: usize,
}

impl NotificationDispatcher {
    pub fn new(
        transports: Vec<Arc<dyn NotificationTransport>>,
        timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            transports: transports
                .into_iter()
                .map(|t| (t.channel().to_string(), t))
                .collect(),
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.transports.keys().cloned().collect();
        names.sort();
        names
    }

    /// Sends `alert` to every target. Outcomes follow the order of `targets`.
    pub async fn dispatch(&self, alert: &Alert, targets: &[ChannelTarget]) -> DispatchResult {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut task_index = HashMap::new();
        let mut statuses: Vec<Option<DeliveryStatus>> = vec![None; targets.len()];

        for (index, target) in targets.iter().enumerate() {
            let Some(transport) = self.transports.get(&target.channel).cloned() else {
                statuses[index] = Some(DeliveryStatus::Failed {
                    reason: format!("no transport registered for channel '{}'", target.channel),
                });
                continue;
            };
            let payload = NotificationPayload::from_alert(alert, &target.channel);
            let recipient = target.recipient.clone();
            let semaphore = semaphore.clone();
            let limit = self.timeout;

            let handle = tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let what = format!("{} transport", transport.channel());
                let sent = with_timeout(&what, limit, transport.send(&recipient, &payload)).await;
                (index, sent)
            });
            task_index.insert(handle.id(), index);
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(()))) => statuses[index] = Some(DeliveryStatus::Delivered),
                Ok((index, Err(e))) => {
                    statuses[index] = Some(DeliveryStatus::Failed {
                        reason: e.to_string(),
                    })
                }
                Err(e) => {
                    if let Some(index) = task_index.get(&e.id()) {
                        statuses[*index] = Some(DeliveryStatus::Failed {
                            reason: format!("channel task aborted: {e}"),
                        });
                    }
                }
            }
        }

        let outcomes: Vec<ChannelOutcome> = targets
            .iter()
            .zip(statuses)
            .map(|(target, status)| {
                let status = status.unwrap_or_else(|| DeliveryStatus::Failed {
                    reason: "channel task produced no result".into(),
                });
                if let DeliveryStatus::Failed { reason } = &status {
                    warn!(alert_id = %alert.id, channel = %target.channel, reason = %reason, "notification failed");
                }
                ChannelOutcome {
                    target: target.clone(),
                    status,
                }
            })
            .collect();

        let delivered = outcomes
            .iter()
            .filter(|o| o.status == DeliveryStatus::Delivered)
            .count();
        info!(alert_id = %alert.id, delivered, total = outcomes.len(), "alert dispatched");

        DispatchResult {
            alert_id: alert.id.clone(),
            outcomes,
        }
    }

    /// Re-sends only the targets that failed in `previous`, keeping its
    /// delivered entries as they were.
    pub async fn redispatch_failed(&self, alert: &Alert, previous: &DispatchResult) -> DispatchResult {
        let retry = previous.failed_targets();
        if retry.is_empty() {
            return previous.clone();
        }
        let retried = self.dispatch(alert, &retry).await;
        let mut fresh: HashMap<ChannelTarget, DeliveryStatus> = retried
            .outcomes
            .into_iter()
            .map(|o| (o.target, o.status))
            .collect();

        let outcomes = previous
            .outcomes
            .iter()
            .map(|o| match fresh.remove(&o.target) {
                Some(status) => ChannelOutcome {
                    target: o.target.clone(),
                    status,
                },
                None => o.clone(),
            })
            .collect();

        DispatchResult {
            alert_id: alert.id.clone(),
            outcomes,
        }
    }
}
