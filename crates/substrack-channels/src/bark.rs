//! Bark channel: iOS push through a Bark server (`POST /push`, API v2).

use async_trait::async_trait;
use substrack_core::config::{BarkCredentials, NotificationConfig};
use substrack_core::error::{Result, SubsTrackError};
use substrack_core::traits::NotifyChannel;
use substrack_core::types::{ChannelResult, ChannelValidation, NotificationOptions};

use crate::http::Reply;

/// Bark push channel. The server URL comes from `BARK_SERVER`.
pub struct BarkChannel {
    client: reqwest::Client,
}

impl BarkChannel {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn deliver(&self, creds: &BarkCredentials, options: &NotificationOptions) -> Result<ChannelResult> {
        let Some(key) = &creds.key else {
            return Err(SubsTrackError::channel("bark device key missing"));
        };
        let url = format!("{}/push", creds.server.trim_end_matches('/'));
        let body = serde_json::json!({
            "device_key": key,
            "title": options.title,
            "body": options.content,
            "isArchive": if creds.save { 1 } else { 0 },
        });

        let response = self.client.post(&url).json(&body).send().await
            .map_err(|e| SubsTrackError::Http(format!("Bark request failed: {e}")))?;
        let reply = Reply::read(response).await?;

        // Bark reports errors in `code` even on HTTP 200.
        let code = reply.json.as_ref().and_then(|j| j["code"].as_i64());
        if !reply.status.is_success() || code != Some(200) {
            let error = reply.error_text("message");
            tracing::warn!(status = reply.status.as_u16(), ?code, "Bark send failed: {error}");
            let result = ChannelResult::failed(self.name(), error);
            return Ok(match reply.json {
                Some(details) => result.with_details(details),
                None => result,
            });
        }

        tracing::info!("🔔 Bark push sent");
        Ok(ChannelResult::sent(self.name()).with_details(reply.require_json()?.clone()))
    }
}

#[async_trait]
impl NotifyChannel for BarkChannel {
    fn name(&self) -> &str { "bark" }

    fn validate(&self, config: &NotificationConfig) -> ChannelValidation {
        ChannelValidation::require([("BARK_KEY", config.bark.key.as_deref())])
    }

    async fn send(&self, options: &NotificationOptions, config: &NotificationConfig) -> ChannelResult {
        let validation = self.validate(config);
        if !validation.is_valid {
            return ChannelResult::missing_config(self.name(), &validation);
        }

        match self.deliver(&config.bark, options).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Bark send error: {e}");
                ChannelResult::failed(self.name(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &str, save: bool) -> NotificationConfig {
        let mut config = NotificationConfig::default();
        config.bark.server = format!("{server}/");
        config.bark.key = Some("device123".into());
        config.bark.save = save;
        config
    }

    #[tokio::test]
    async fn test_send_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/push"))
            .and(body_json(serde_json::json!({
                "device_key": "device123",
                "title": "Expiring",
                "body": "soon",
                "isArchive": 1,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200, "message": "success"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let channel = BarkChannel::new(reqwest::Client::new());
        let result = channel
            .send(&NotificationOptions::new("Expiring", "soon"), &config(&server.uri(), true))
            .await;
        assert!(result.success, "{result:?}");
    }

    #[tokio::test]
    async fn test_http_200_with_error_code_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 400, "message": "failed to get device token"
            })))
            .mount(&server)
            .await;

        let channel = BarkChannel::new(reqwest::Client::new());
        let result = channel
            .send(&NotificationOptions::new("t", "c"), &config(&server.uri(), false))
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("failed to get device token"));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let channel = BarkChannel::new(reqwest::Client::new());
        let result = channel
            .send(&NotificationOptions::new("t", "c"), &NotificationConfig::default())
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("BARK_KEY"));
    }
}
