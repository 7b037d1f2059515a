//! Notification channel trait: one implementation per delivery mechanism.

use async_trait::async_trait;

use crate::config::NotificationConfig;
use crate::types::{ChannelResult, ChannelValidation, NotificationOptions};

/// A pluggable delivery mechanism (Telegram, email, webhook, ...).
///
/// `send` performs at most one network call and reports every transport or
/// response problem inside the returned [`ChannelResult`]; it never errors.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Registry key, matched against `ENABLED_NOTIFIERS`.
    fn name(&self) -> &str;

    /// Check that the credentials this channel needs are present.
    fn validate(&self, config: &NotificationConfig) -> ChannelValidation;

    /// Deliver one message.
    async fn send(&self, options: &NotificationOptions, config: &NotificationConfig) -> ChannelResult;
}
