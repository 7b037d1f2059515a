//! Reminder engine: decides, per subscription and per tick, whether to
//! renew, remind, or leave it alone.
//!
//! Evaluation never fails. Every error is logged and turned into a
//! `Skipped` decision with `success = false`; the only side effect is the
//! dispatch call, and the only output is an optional updated copy of the
//! subscription for the tick runner to persist.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use substrack_core::config::{NotificationConfig, ReminderMode};
use substrack_core::error::{Result, SubsTrackError};
use substrack_core::time::format_instant;
use substrack_core::types::{NotificationOptions, Subscription};

use crate::calendar::CalendarZone;
use crate::notify::NotifyRouter;
use crate::period::add_period;

/// Upper bound on periods applied in one catch-up renewal.
pub const MAX_RENEWAL_ITERATIONS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderAction {
    Skipped,
    Renewed,
    Reminded,
}

/// Result of evaluating one subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: ReminderAction,
    pub success: bool,
    /// Updated record to persist, when anything changed.
    pub mutated: Option<Subscription>,
}

impl Decision {
    fn skipped() -> Self {
        Self { action: ReminderAction::Skipped, success: true, mutated: None }
    }

    fn failed() -> Self {
        Self { action: ReminderAction::Skipped, success: false, mutated: None }
    }

    /// Nothing was sent; report the renewal if one happened.
    fn idle(working: Subscription, renewed: bool) -> Self {
        if renewed {
            Self { action: ReminderAction::Renewed, success: true, mutated: Some(working) }
        } else {
            Self::skipped()
        }
    }
}

/// What the tick runner calls once per subscription.
#[async_trait]
pub trait SubscriptionEvaluator: Send + Sync {
    async fn evaluate(&self, sub: &Subscription, now: DateTime<Utc>, config: &NotificationConfig) -> Decision;

    /// Evaluation for a tick outside the notification hours.
    async fn evaluate_renewal(&self, sub: &Subscription, now: DateTime<Utc>, config: &NotificationConfig) -> Decision;
}

/// Per-subscription lifecycle evaluation.
pub struct ReminderEngine {
    router: Arc<NotifyRouter>,
    zone: CalendarZone,
}

impl ReminderEngine {
    pub fn new(router: Arc<NotifyRouter>) -> Self {
        Self {
            router,
            zone: CalendarZone::utc(),
        }
    }

    /// Zone whose calendar days drive the reminder window and DAILY mode.
    pub fn with_zone(mut self, zone: CalendarZone) -> Self {
        self.zone = zone;
        self
    }

    /// Full evaluation: renewal, window check, suppression, dispatch.
    pub async fn evaluate(&self, sub: &Subscription, now: DateTime<Utc>, config: &NotificationConfig) -> Decision {
        self.guarded(sub, now, config, true).await
    }

    /// Renewal only. Subscriptions that would be reminded are left alone.
    pub async fn evaluate_renewal(&self, sub: &Subscription, now: DateTime<Utc>, config: &NotificationConfig) -> Decision {
        self.guarded(sub, now, config, false).await
    }

    async fn guarded(&self, sub: &Subscription, now: DateTime<Utc>, config: &NotificationConfig, remind: bool) -> Decision {
        match self.run(sub, now, config, remind).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::error!(id = %sub.id, "Evaluation of '{}' failed: {e}", sub.name);
                Decision::failed()
            }
        }
    }

    async fn run(&self, sub: &Subscription, now: DateTime<Utc>, config: &NotificationConfig, remind: bool) -> Result<Decision> {
        if !sub.is_active || !sub.is_reminder_set {
            return Ok(Decision::skipped());
        }
        let Some(window) = sub.reminder_me else {
            return Ok(Decision::skipped());
        };
        let Some(mut expiry) = sub.expiry()? else {
            return Ok(Decision::skipped());
        };

        let mut working = sub.clone();
        let mut renewed = false;
        if sub.auto_renew && expiry < now {
            match self.catch_up(sub, expiry, now) {
                Ok(Some(next)) => {
                    let next_text = format_instant(next);
                    tracing::info!(
                        id = %sub.id,
                        from = sub.expiry_date.as_deref().unwrap_or_default(),
                        to = %next_text,
                        "🔁 Auto-renewed '{}'",
                        sub.name
                    );
                    working.expiry_date = Some(next_text.clone());
                    working.last_reminder_sent_at = None;
                    working.last_checked_expiry_date = Some(next_text);
                    working.updated_at = Some(format_instant(now));
                    expiry = next;
                    renewed = true;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(id = %sub.id, "{e}"),
            }
        }

        let days_left = self.zone.days_between(now, expiry);
        if days_left < 0 || days_left > i64::from(window) {
            return Ok(Decision::idle(working, renewed));
        }
        if !remind {
            tracing::debug!(id = %sub.id, days_left, "Reminder held back for this pass");
            return Ok(Decision::idle(working, renewed));
        }
        if !self.should_send(&working, now, config.reminder_mode) {
            tracing::debug!(id = %sub.id, days_left, "Reminder already sent");
            return Ok(Decision::idle(working, renewed));
        }

        let message = self.reminder_message(&working, expiry, days_left, now);
        let outcome = self.router.dispatch(&message, config).await;

        if outcome.is_useful() {
            working.last_reminder_sent_at = Some(format_instant(now));
            working.last_checked_expiry_date = working.expiry_date.clone();
            working.updated_at = Some(format_instant(now));
            return Ok(Decision {
                action: ReminderAction::Reminded,
                success: true,
                mutated: Some(working),
            });
        }

        tracing::warn!(
            id = %sub.id,
            channels = outcome.total_channels,
            "No channel delivered the reminder for '{}'",
            sub.name
        );
        Ok(Decision {
            action: ReminderAction::Reminded,
            success: false,
            mutated: renewed.then_some(working),
        })
    }

    /// Roll `expiry` forward one period at a time until it reaches `now`.
    ///
    /// `Ok(None)` when the subscription has no usable period.
    fn catch_up(&self, sub: &Subscription, expiry: DateTime<Utc>, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        let (Some(value), Some(unit)) = (sub.period_value, sub.period_unit()) else {
            return Ok(None);
        };
        let unit = match unit {
            Ok(unit) => unit,
            Err(e) => {
                tracing::warn!(id = %sub.id, "Not renewing '{}': {e}", sub.name);
                return Ok(None);
            }
        };

        let overflow = || SubsTrackError::RenewalOverflow {
            id: sub.id.clone(),
            iterations: MAX_RENEWAL_ITERATIONS,
        };
        let mut next = expiry;
        for _ in 0..MAX_RENEWAL_ITERATIONS {
            next = add_period(next, value, unit).ok_or_else(overflow)?;
            if next >= now {
                return Ok(Some(next));
            }
        }
        Err(overflow())
    }

    /// An unreadable `last_reminder_sent_at` still counts as sent: ONCE stays
    /// quiet and DAILY treats it as an earlier day.
    fn should_send(&self, sub: &Subscription, now: DateTime<Utc>, mode: ReminderMode) -> bool {
        if sub.expiry_changed_since_check() {
            return true;
        }
        let last_sent = match sub.last_reminder_sent() {
            Ok(None) => return true,
            Ok(Some(at)) => Some(at),
            Err(e) => {
                tracing::warn!(id = %sub.id, "Unreadable last reminder time for '{}': {e}", sub.name);
                None
            }
        };
        match mode {
            ReminderMode::Once => false,
            ReminderMode::Daily => last_sent.is_none_or(|at| !self.zone.same_day(at, now)),
        }
    }

    fn reminder_message(&self, sub: &Subscription, expiry: DateTime<Utc>, days_left: i64, now: DateTime<Utc>) -> NotificationOptions {
        let when = match days_left {
            0 => "today".to_string(),
            1 => "in 1 day".to_string(),
            n => format!("in {n} days"),
        };
        let date = self.zone.date_of(expiry).format("%Y-%m-%d").to_string();
        let content = format!(
            "Your subscription \"{}\" expires {when}.\n\nExpiry date: {date}\n\nPlease renew it in time if you want to keep it.",
            sub.name
        );

        NotificationOptions::new(format!("Subscription expiring: {}", sub.name), content)
            .at(now)
            .with_metadata("subscriptionId", sub.id.clone())
            .with_metadata("subscriptionName", sub.name.clone())
            .with_metadata("expiryDate", date)
            .with_metadata("daysLeft", days_left)
    }
}

#[async_trait]
impl SubscriptionEvaluator for ReminderEngine {
    async fn evaluate(&self, sub: &Subscription, now: DateTime<Utc>, config: &NotificationConfig) -> Decision {
        ReminderEngine::evaluate(self, sub, now, config).await
    }

    async fn evaluate_renewal(&self, sub: &Subscription, now: DateTime<Utc>, config: &NotificationConfig) -> Decision {
        ReminderEngine::evaluate_renewal(self, sub, now, config).await
    }
}
