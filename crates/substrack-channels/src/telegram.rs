//! Telegram Bot channel: `sendMessage` to a single chat.

use async_trait::async_trait;
use substrack_core::config::NotificationConfig;
use substrack_core::error::{Result, SubsTrackError};
use substrack_core::traits::NotifyChannel;
use substrack_core::types::{ChannelResult, ChannelValidation, NotificationOptions};

use crate::http::Reply;

pub const TELEGRAM_API: &str = "https://api.telegram.org";

/// Telegram Bot API channel.
pub struct TelegramChannel {
    client: reqwest::Client,
    api_base: String,
}

impl TelegramChannel {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client, api_base: TELEGRAM_API.into() }
    }

    /// Point the channel at another API host (self-hosted bot API, tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn deliver(
        &self,
        token: &str,
        chat_id: &str,
        options: &NotificationOptions,
    ) -> Result<ChannelResult> {
        let url = format!("{}/bot{token}/sendMessage", self.api_base);
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": format!("*{}*\n\n{}", options.title, options.content),
            "parse_mode": "Markdown",
        });

        let response = self.client.post(&url).json(&body).send().await
            .map_err(|e| SubsTrackError::Http(format!("Telegram request failed: {e}")))?;
        let reply = Reply::read(response).await?;

        if !reply.status.is_success() {
            let error = reply.error_text("description");
            tracing::warn!(status = reply.status.as_u16(), "Telegram send failed: {error}");
            let result = ChannelResult::failed(self.name(), error);
            return Ok(match reply.json {
                Some(details) => result.with_details(details),
                None => result,
            });
        }

        let json = reply.require_json()?;
        tracing::info!("✈️ Telegram sent: message_id={}", json["result"]["message_id"]);
        Ok(ChannelResult::sent(self.name()).with_details(json["result"].clone()))
    }
}

#[async_trait]
impl NotifyChannel for TelegramChannel {
    fn name(&self) -> &str { "telegram" }

    fn validate(&self, config: &NotificationConfig) -> ChannelValidation {
        ChannelValidation::require([
            ("TELEGRAM_BOT_TOKEN", config.telegram.bot_token.as_deref()),
            ("TELEGRAM_CHAT_ID", config.telegram.chat_id.as_deref()),
        ])
    }

    async fn send(&self, options: &NotificationOptions, config: &NotificationConfig) -> ChannelResult {
        let validation = self.validate(config);
        let (Some(token), Some(chat_id), true) = (
            config.telegram.bot_token.as_deref(),
            config.telegram.chat_id.as_deref(),
            validation.is_valid,
        ) else {
            return ChannelResult::missing_config(self.name(), &validation);
        };

        match self.deliver(token, chat_id, options).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Telegram send error: {e}");
                ChannelResult::failed(self.name(), e.to_string())
            }
        }
    }
}
