//! # SubsTrack Channels
//! Notification channel adapters and the registry the dispatcher fans out over.
//!
//! ## Channel Registry
//! | Channel | Transport |
//! |---------|-----------|
//! | telegram | Telegram Bot API `sendMessage` |
//! | email | Resend HTTP API |
//! | webhook | Any HTTP endpoint, templated JSON body |
//! | bark | Bark push server |
//!
//! Adding a channel means implementing [`NotifyChannel`] and registering it;
//! the dispatcher only ever looks channels up by name.

pub mod bark;
pub mod email;
mod http;
pub mod telegram;
pub mod template;
pub mod webhook;

use substrack_core::config::NotificationConfig;
use substrack_core::traits::NotifyChannel;
use substrack_core::types::ChannelValidation;

/// Channel registry: maps channel names to adapters.
pub struct ChannelRegistry {
    channels: Vec<Box<dyn NotifyChannel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self { channels: vec![] }
    }

    /// Register a channel. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(&mut self, channel: Box<dyn NotifyChannel>) {
        tracing::debug!("📦 Registered channel: {}", channel.name());
        self.channels.retain(|c| c.name() != channel.name());
        self.channels.push(channel);
    }

    pub fn get(&self, name: &str) -> Option<&dyn NotifyChannel> {
        self.channels.iter().find(|c| c.name() == name).map(|c| c.as_ref())
    }

    /// Create registry with the built-in channels, all sharing one HTTP client.
    pub fn with_defaults(client: reqwest::Client) -> Self {
        let mut reg = Self::new();
        reg.register(Box::new(telegram::TelegramChannel::new(client.clone())));
        reg.register(Box::new(email::EmailChannel::new(client.clone())));
        reg.register(Box::new(webhook::WebhookChannel::new(client.clone())));
        reg.register(Box::new(bark::BarkChannel::new(client)));
        reg
    }

    /// Validate every enabled channel. Unknown names report themselves as
    /// invalid with no missing fields.
    pub fn validate_enabled(&self, config: &NotificationConfig) -> Vec<(String, ChannelValidation)> {
        config
            .enabled_channels
            .iter()
            .map(|name| {
                let validation = match self.get(name) {
                    Some(channel) => channel.validate(config),
                    None => ChannelValidation { is_valid: false, missing_fields: vec![] },
                };
                (name.clone(), validation)
            })
            .collect()
    }

    /// List channel names only.
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name().to_string()).collect()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self { Self::with_defaults(reqwest::Client::new()) }
}
