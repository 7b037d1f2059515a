//! Scripted channels for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use substrack_channels::ChannelRegistry;
use substrack_core::config::NotificationConfig;
use substrack_core::traits::NotifyChannel;
use substrack_core::types::{ChannelResult, ChannelValidation, NotificationOptions};

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
    Hang,
}

pub struct FakeChannel {
    name: String,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl FakeChannel {
    pub fn new(name: &str, behavior: Behavior) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let channel = Self { name: name.into(), behavior, calls: calls.clone() };
        (channel, calls)
    }
}

#[async_trait]
impl NotifyChannel for FakeChannel {
    fn name(&self) -> &str { &self.name }

    fn validate(&self, _config: &NotificationConfig) -> ChannelValidation {
        ChannelValidation::from_missing(vec![])
    }

    async fn send(&self, _options: &NotificationOptions, _config: &NotificationConfig) -> ChannelResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => ChannelResult::sent(&self.name),
            Behavior::Fail => ChannelResult::failed(&self.name, "HTTP 500"),
            Behavior::Panic => panic!("adapter exploded"),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                ChannelResult::sent(&self.name)
            }
        }
    }
}

/// Registry of fake channels plus a config enabling all of them in order.
pub fn registry(channels: &[(&str, Behavior)]) -> (Arc<ChannelRegistry>, NotificationConfig, Vec<Arc<AtomicUsize>>) {
    let mut registry = ChannelRegistry::new();
    let mut counters = Vec::new();
    let mut config = NotificationConfig::default();
    for (name, behavior) in channels {
        let (channel, calls) = FakeChannel::new(name, *behavior);
        registry.register(Box::new(channel));
        counters.push(calls);
        config.enabled_channels.push((*name).to_string());
    }
    (Arc::new(registry), config, counters)
}
