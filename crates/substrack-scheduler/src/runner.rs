//! Tick runner: one evaluation pass over every subscription, followed by a
//! single batched write-back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use substrack_core::error::Result;
use substrack_core::traits::{ConfigProvider, SubscriptionStore};
use substrack_core::types::Subscription;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::engine::{Decision, ReminderAction, SubscriptionEvaluator};

/// Counters for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    pub total: usize,
    /// Evaluations that returned a decision.
    pub processed: usize,
    pub reminded: usize,
    pub renewed: usize,
    pub skipped: usize,
    /// Evaluations that failed, including ones that panicked.
    pub failed: usize,
    /// Subscriptions written back at the end of the tick.
    pub persisted: usize,
    /// The tick ran outside the notification hours (renewals only).
    pub quiet_hours: bool,
    /// Set when config or store access ended the tick early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunStatistics {
    fn record(&mut self, decision: &Decision) {
        self.processed += 1;
        if !decision.success {
            self.failed += 1;
            return;
        }
        match decision.action {
            ReminderAction::Reminded => self.reminded += 1,
            ReminderAction::Renewed => self.renewed += 1,
            ReminderAction::Skipped => self.skipped += 1,
        }
    }
}

/// Drives ticks against a store and config provider.
pub struct TickRunner {
    engine: Arc<dyn SubscriptionEvaluator>,
    store: Arc<dyn SubscriptionStore>,
    config: Arc<dyn ConfigProvider>,
}

impl TickRunner {
    pub fn new(
        engine: Arc<dyn SubscriptionEvaluator>,
        store: Arc<dyn SubscriptionStore>,
        config: Arc<dyn ConfigProvider>,
    ) -> Self {
        Self { engine, store, config }
    }

    /// Run one tick at `now`. Never fails; problems show up in the returned
    /// statistics and the log.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> RunStatistics {
        let mut stats = RunStatistics::default();

        let config = match self.config.get_config().await {
            Ok(config) => Arc::new(config),
            Err(e) => {
                tracing::error!("❌ Tick aborted, config unavailable: {e}");
                stats.error = Some(e.to_string());
                return stats;
            }
        };

        let hour = now.hour();
        stats.quiet_hours = !config.is_hour_allowed(hour);
        if stats.quiet_hours {
            tracing::info!(hour, "🔕 Outside notification hours, running renewals only");
        }

        let subscriptions = match self.store.get_all().await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                tracing::error!("❌ Tick aborted, subscriptions unavailable: {e}");
                stats.error = Some(e.to_string());
                return stats;
            }
        };
        stats.total = subscriptions.len();

        let mut tasks = JoinSet::new();
        for sub in subscriptions {
            let engine = self.engine.clone();
            let config = config.clone();
            let remind = !stats.quiet_hours;
            tasks.spawn(async move {
                if remind {
                    engine.evaluate(&sub, now, &config).await
                } else {
                    engine.evaluate_renewal(&sub, now, &config).await
                }
            });
        }

        let mut mutations: HashMap<String, Subscription> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(decision) => {
                    stats.record(&decision);
                    if let Some(updated) = decision.mutated {
                        mutations.insert(updated.id.clone(), updated);
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!("Subscription evaluation did not complete: {e}");
                }
            }
        }

        if !mutations.is_empty() {
            match self.write_back(mutations).await {
                Ok(persisted) => stats.persisted = persisted,
                Err(e) => {
                    tracing::error!("❌ Writing subscription updates failed: {e}");
                    stats.error = Some(e.to_string());
                }
            }
        }

        tracing::info!(
            total = stats.total,
            processed = stats.processed,
            reminded = stats.reminded,
            renewed = stats.renewed,
            skipped = stats.skipped,
            failed = stats.failed,
            persisted = stats.persisted,
            "📊 Tick finished"
        );
        stats
    }

    /// Re-read the list, replace updated records by id, write it back once.
    async fn write_back(&self, mut updates: HashMap<String, Subscription>) -> Result<usize> {
        let mut current = self.store.get_all().await?;
        let mut replaced = 0;
        for slot in current.iter_mut() {
            if let Some(updated) = updates.remove(&slot.id) {
                *slot = updated;
                replaced += 1;
            }
        }
        for id in updates.keys() {
            tracing::warn!(id = %id, "Subscription removed during tick, dropping its update");
        }
        if replaced == 0 {
            return Ok(0);
        }

        self.store.put_all(&current).await?;
        tracing::info!(updated = replaced, total = current.len(), "💾 Subscription updates persisted");
        Ok(replaced)
    }

    /// Tick every `period` until the future is dropped. Ticks run one after
    /// another; a tick that overruns its slot causes the missed slots to be
    /// skipped.
    pub async fn run_every(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.run_tick(Utc::now()).await;
        }
    }
}
