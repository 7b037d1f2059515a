//! Email channel: delivered through the Resend HTTP API.

use async_trait::async_trait;
use substrack_core::config::{EmailCredentials, NotificationConfig};
use substrack_core::error::{Result, SubsTrackError};
use substrack_core::traits::NotifyChannel;
use substrack_core::types::{ChannelResult, ChannelValidation, NotificationOptions};

use crate::http::Reply;

pub const RESEND_API: &str = "https://api.resend.com";

/// Resend email channel.
pub struct EmailChannel {
    client: reqwest::Client,
    api_base: String,
}

impl EmailChannel {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client, api_base: RESEND_API.into() }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn deliver(
        &self,
        creds: &EmailCredentials,
        options: &NotificationOptions,
    ) -> Result<ChannelResult> {
        let (Some(api_key), Some(from), Some(to)) = (&creds.api_key, &creds.from, &creds.to) else {
            return Err(SubsTrackError::channel("email credentials incomplete"));
        };

        let sender = match &creds.from_name {
            Some(name) => format!("{name} <{from}>"),
            None => from.clone(),
        };
        let body = serde_json::json!({
            "from": sender,
            "to": [to],
            "subject": options.title,
            "html": render_html(&options.title, &options.content),
        });

        let response = self.client
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SubsTrackError::Http(format!("Resend request failed: {e}")))?;
        let reply = Reply::read(response).await?;

        if !reply.status.is_success() {
            let error = reply.error_text("message");
            tracing::warn!(status = reply.status.as_u16(), "Email send failed: {error}");
            let result = ChannelResult::failed(self.name(), error);
            return Ok(match reply.json {
                Some(details) => result.with_details(details),
                None => result,
            });
        }

        let json = reply.require_json()?;
        tracing::info!("📧 Email sent: id={}", json["id"]);
        Ok(ChannelResult::sent(self.name()).with_details(json.clone()))
    }
}

#[async_trait]
impl NotifyChannel for EmailChannel {
    fn name(&self) -> &str { "email" }

    fn validate(&self, config: &NotificationConfig) -> ChannelValidation {
        ChannelValidation::require([
            ("RESEND_API_KEY", config.email.api_key.as_deref()),
            ("EMAIL_FROM", config.email.from.as_deref()),
            ("EMAIL_TO", config.email.to.as_deref()),
        ])
    }

    async fn send(&self, options: &NotificationOptions, config: &NotificationConfig) -> ChannelResult {
        let validation = self.validate(config);
        if !validation.is_valid {
            return ChannelResult::missing_config(self.name(), &validation);
        }

        match self.deliver(&config.email, options).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Email send error: {e}");
                ChannelResult::failed(self.name(), e.to_string())
            }
        }
    }
}

fn render_html(title: &str, content: &str) -> String {
    format!(
        concat!(
            r#"<div style="font-family: sans-serif; line-height: 1.6;">"#,
            r#"<h2 style="color: #333;">{}</h2>"#,
            r#"<p style="color: #666;">{}</p>"#,
            r#"<hr style="margin: 20px 0; border: none; border-top: 1px solid #eee;">"#,
            r#"<p style="color: #999; font-size: 12px;">Sent by SubsTrack</p>"#,
            "</div>"
        ),
        escape_html(title),
        escape_html(content).replace('\n', "<br>"),
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(from_name: Option<&str>) -> NotificationConfig {
        let mut config = NotificationConfig::default();
        config.email.api_key = Some("re_test".into());
        config.email.from = Some("noreply@example.com".into());
        config.email.from_name = from_name.map(String::from);
        config.email.to = Some("me@example.com".into());
        config
    }

    #[test]
    fn test_render_html_escapes_and_breaks_lines() {
        let html = render_html("A & B", "line1\n<script>");
        assert!(html.contains("<h2 style=\"color: #333;\">A &amp; B</h2>"));
        assert!(html.contains("line1<br>&lt;script&gt;"));
    }

    #[test]
    fn test_validate() {
        let channel = EmailChannel::new(reqwest::Client::new());
        let v = channel.validate(&NotificationConfig::default());
        assert_eq!(v.missing_fields, vec!["RESEND_API_KEY", "EMAIL_FROM", "EMAIL_TO"]);
        assert!(channel.validate(&config(None)).is_valid);
    }

    #[tokio::test]
    async fn test_send_success_with_display_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_partial_json(serde_json::json!({
                "from": "SubsTrack <noreply@example.com>",
                "to": ["me@example.com"],
                "subject": "Expiring",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "em_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let channel = EmailChannel::new(reqwest::Client::new()).with_api_base(server.uri());
        let result = channel
            .send(&NotificationOptions::new("Expiring", "soon"), &config(Some("SubsTrack")))
            .await;
        assert!(result.success, "{result:?}");
        assert_eq!(result.details.unwrap()["id"], "em_1");
    }

    #[tokio::test]
    async fn test_send_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "statusCode": 422,
                "message": "Invalid `to` field"
            })))
            .mount(&server)
            .await;

        let channel = EmailChannel::new(reqwest::Client::new()).with_api_base(server.uri());
        let result = channel.send(&NotificationOptions::new("t", "c"), &config(None)).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Invalid `to` field"));
        assert_eq!(result.details.unwrap()["statusCode"], 422);
    }
}
