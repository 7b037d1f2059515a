//! Notification router: fans one message out to every enabled channel.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Timelike;
use futures::FutureExt;
use futures::future::join_all;
use substrack_channels::ChannelRegistry;
use substrack_core::config::NotificationConfig;
use substrack_core::error::SubsTrackError;
use substrack_core::types::{ChannelResult, NotificationOptions, NotificationOutcome};

/// Deadline for a single channel send.
pub const DEFAULT_CHANNEL_TIMEOUT: Duration = Duration::from_secs(10);

/// Routes notifications to the channels named in the config.
///
/// Every enabled channel is attempted concurrently and awaited to completion.
/// A channel that errors, panics, or overruns its deadline becomes a failed
/// [`ChannelResult`]; nothing here returns an error.
pub struct NotifyRouter {
    registry: Arc<ChannelRegistry>,
    timeout: Duration,
}

impl NotifyRouter {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self {
            registry,
            timeout: DEFAULT_CHANNEL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send `options` to every enabled channel.
    ///
    /// Returns a zero-channel outcome when the UTC hour of `options.timestamp`
    /// is outside the notification hours or when no channel is enabled.
    pub async fn dispatch(&self, options: &NotificationOptions, config: &NotificationConfig) -> NotificationOutcome {
        let hour = options.timestamp.hour();
        if !config.is_hour_allowed(hour) {
            tracing::info!(hour, "🔕 Outside notification hours, not dispatching \"{}\"", options.title);
            return NotificationOutcome::empty();
        }
        if config.enabled_channels.is_empty() {
            tracing::debug!("No notification channels enabled");
            return NotificationOutcome::empty();
        }

        tracing::info!(
            channels = config.enabled_channels.len(),
            "📣 Dispatching \"{}\"",
            options.title
        );
        let sends = config
            .enabled_channels
            .iter()
            .map(|name| self.send_one(name, options, config));
        let outcome = NotificationOutcome::from_results(join_all(sends).await);

        tracing::info!(
            total = outcome.total_channels,
            success = outcome.success_count,
            failure = outcome.failure_count,
            "Dispatch finished"
        );
        outcome
    }

    async fn send_one(&self, name: &str, options: &NotificationOptions, config: &NotificationConfig) -> ChannelResult {
        let Some(channel) = self.registry.get(name) else {
            let err = SubsTrackError::UnknownChannel(name.to_string());
            tracing::warn!(channel = name, "Skipping notification channel: {err}");
            return ChannelResult::failed(name, err.to_string());
        };

        let send = AssertUnwindSafe(channel.send(options, config)).catch_unwind();
        let result = match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(result)) => result,
            Ok(Err(payload)) => {
                ChannelResult::failed(name, format!("channel panicked: {}", panic_message(payload.as_ref())))
            }
            Err(_) => {
                let err = SubsTrackError::Timeout(format!("no response within {:?}", self.timeout));
                ChannelResult::failed(name, err.to_string())
            }
        };

        if !result.success {
            tracing::warn!(
                channel = name,
                error = result.error.as_deref().unwrap_or("unknown"),
                "Channel delivery failed"
            );
        }
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{registry, Behavior};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::Ordering;

    fn options_at(hour: u32) -> NotificationOptions {
        NotificationOptions::new("Subscription expiring: Netflix", "soon")
            .at(Utc.with_ymd_and_hms(2024, 1, 10, hour, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_one_success_of_three_is_useful() {
        let (reg, config, _) = registry(&[
            ("alpha", Behavior::Fail),
            ("beta", Behavior::Succeed),
            ("gamma", Behavior::Fail),
        ]);
        let outcome = NotifyRouter::new(reg).dispatch(&options_at(10), &config).await;

        assert_eq!(outcome.total_channels, 3);
        assert_eq!(outcome.success_count, 1);
        assert_eq!(outcome.failure_count, 2);
        assert!(outcome.is_useful());
        let names: Vec<_> = outcome.results.iter().map(|r| r.channel.as_str()).collect();
        assert_eq!(names, ["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn test_quiet_hours_sends_nothing() {
        let (reg, mut config, calls) = registry(&[("alpha", Behavior::Succeed)]);
        config.notification_hours = vec![9, 18];

        let router = NotifyRouter::new(reg);
        let outcome = router.dispatch(&options_at(14), &config).await;
        assert_eq!(outcome, NotificationOutcome::empty());
        assert_eq!(calls[0].load(Ordering::SeqCst), 0);

        let outcome = router.dispatch(&options_at(9), &config).await;
        assert_eq!(outcome.success_count, 1);
    }

    #[tokio::test]
    async fn test_no_enabled_channels() {
        let (reg, _, _) = registry(&[("alpha", Behavior::Succeed)]);
        let outcome = NotifyRouter::new(reg)
            .dispatch(&options_at(10), &NotificationConfig::default())
            .await;
        assert_eq!(outcome.total_channels, 0);
        assert!(!outcome.is_total_failure());
    }

    #[tokio::test]
    async fn test_unknown_channel_is_synthesized_failure() {
        let (reg, mut config, _) = registry(&[("alpha", Behavior::Succeed)]);
        config.enabled_channels.push("pager".into());

        let outcome = NotifyRouter::new(reg).dispatch(&options_at(10), &config).await;
        assert_eq!(outcome.total_channels, 2);
        assert_eq!(outcome.success_count, 1);
        assert_eq!(outcome.results[1].channel, "pager");
        assert_eq!(outcome.results[1].error.as_deref(), Some("unknown channel"));
    }

    #[tokio::test]
    async fn test_panicking_channel_does_not_affect_siblings() {
        let (reg, config, _) = registry(&[("boom", Behavior::Panic), ("alpha", Behavior::Succeed)]);
        let outcome = NotifyRouter::new(reg).dispatch(&options_at(10), &config).await;

        assert_eq!(outcome.success_count, 1);
        assert!(!outcome.results[0].success);
        assert!(outcome.results[0].error.as_deref().unwrap().contains("adapter exploded"));
    }

    #[tokio::test]
    async fn test_hung_channel_times_out() {
        let (reg, config, _) = registry(&[("slow", Behavior::Hang), ("alpha", Behavior::Succeed)]);
        let router = NotifyRouter::new(reg).with_timeout(Duration::from_millis(50));

        let started = std::time::Instant::now();
        let outcome = router.dispatch(&options_at(10), &config).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(outcome.success_count, 1);
        assert!(outcome.results[0].error.as_deref().unwrap().starts_with("Timeout"));
    }

    #[tokio::test]
    async fn test_all_fail_is_total_failure() {
        let (reg, config, _) = registry(&[("alpha", Behavior::Fail), ("beta", Behavior::Fail)]);
        let outcome = NotifyRouter::new(reg).dispatch(&options_at(10), &config).await;
        assert!(outcome.is_total_failure());
    }
}
