//! Webhook channel: outbound HTTP call with a templated JSON body.
//!
//! Useful for integrating with external systems (Zapier, n8n, custom APIs).

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use substrack_core::config::{NotificationConfig, WebhookCredentials};
use substrack_core::error::{Result, SubsTrackError};
use substrack_core::time::format_instant;
use substrack_core::traits::NotifyChannel;
use substrack_core::types::{ChannelResult, ChannelValidation, NotificationOptions};

use crate::http::Reply;
use crate::template::{self, TemplateVars};

/// Webhook channel.
pub struct WebhookChannel {
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Render the request body. `None` for methods that carry no body.
    pub fn render_body(creds: &WebhookCredentials, options: &NotificationOptions) -> Result<Option<String>> {
        if matches!(creds.method.as_str(), "GET" | "HEAD") {
            return Ok(None);
        }
        let template = creds.template.as_deref().unwrap_or(template::DEFAULT_TEMPLATE);
        let timestamp = format_instant(options.timestamp);
        template::render(template, TemplateVars {
            title: &options.title,
            content: &options.content,
            timestamp: &timestamp,
        })
        .map(Some)
    }

    /// `Content-Type: application/json` overlaid with the configured headers.
    fn build_headers(creds: &WebhookCredentials) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let Some(raw) = &creds.headers else {
            return headers;
        };
        let custom: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(raw) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("Webhook headers are not a JSON object ({e}), using defaults");
                return headers;
            }
        };
        for (name, value) in custom {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!("Skipping invalid webhook header {name:?}"),
            }
        }
        headers
    }

    async fn deliver(&self, creds: &WebhookCredentials, options: &NotificationOptions) -> Result<ChannelResult> {
        let Some(url) = &creds.url else {
            return Err(SubsTrackError::channel("webhook url missing"));
        };
        let method = Method::from_bytes(creds.method.as_bytes())
            .map_err(|_| SubsTrackError::channel(format!("invalid webhook method {:?}", creds.method)))?;
        let body = Self::render_body(creds, options)?;

        let mut request = self.client.request(method, url).headers(Self::build_headers(creds));
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await
            .map_err(|e| SubsTrackError::Http(format!("Webhook request failed: {e}")))?;
        let reply = Reply::read(response).await?;
        let details = serde_json::json!({
            "status": reply.status.as_u16(),
            "body": reply.text,
        });

        if !reply.status.is_success() {
            tracing::warn!(status = reply.status.as_u16(), "Webhook send failed");
            return Ok(ChannelResult::failed(self.name(), format!("HTTP {}", reply.status.as_u16()))
                .with_details(details));
        }

        tracing::info!("🪝 Webhook sent: HTTP {}", reply.status.as_u16());
        Ok(ChannelResult::sent(self.name()).with_details(details))
    }
}

#[async_trait]
impl NotifyChannel for WebhookChannel {
    fn name(&self) -> &str { "webhook" }

    fn validate(&self, config: &NotificationConfig) -> ChannelValidation {
        ChannelValidation::require([("WEBHOOK_URL", config.webhook.url.as_deref())])
    }

    async fn send(&self, options: &NotificationOptions, config: &NotificationConfig) -> ChannelResult {
        let validation = self.validate(config);
        if !validation.is_valid {
            return ChannelResult::missing_config(self.name(), &validation);
        }

        match self.deliver(&config.webhook, options).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Webhook send error: {e}");
                ChannelResult::failed(self.name(), e.to_string())
            }
        }
    }
}
