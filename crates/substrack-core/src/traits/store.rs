//! Persistence traits: list-granularity subscription store and config provider.

use async_trait::async_trait;

use crate::config::NotificationConfig;
use crate::error::Result;
use crate::types::Subscription;

/// Whole-list subscription storage: one read returns everything, one write
/// replaces everything. No record-level API.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Subscription>>;

    async fn put_all(&self, subscriptions: &[Subscription]) -> Result<()>;
}

/// Source of the current [`NotificationConfig`].
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    async fn get_config(&self) -> Result<NotificationConfig>;
}
