//! Notification configuration, parsed from the stored config blob.
//!
//! The blob is a flat JSON object with upper-case keys shared with the admin
//! UI. Parsing is lenient: empty strings count as absent, notification hours
//! are normalised, and an unrecognised reminder mode falls back to `ONCE`.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How often a reminder may repeat inside the reminder window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReminderMode {
    /// Only the first time the subscription enters its window.
    #[default]
    Once,
    /// Once per calendar day while inside the window.
    Daily,
}

impl std::fmt::Display for ReminderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderMode::Once => write!(f, "ONCE"),
            ReminderMode::Daily => write!(f, "DAILY"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramCredentials {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

/// Resend API credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailCredentials {
    pub api_key: Option<String>,
    pub from: Option<String>,
    pub from_name: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookCredentials {
    pub url: Option<String>,
    pub method: String,
    /// JSON object of extra headers, kept raw and parsed at send time.
    pub headers: Option<String>,
    pub template: Option<String>,
}

impl Default for WebhookCredentials {
    fn default() -> Self {
        Self {
            url: None,
            method: "POST".into(),
            headers: None,
            template: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarkCredentials {
    pub server: String,
    pub key: Option<String>,
    /// Ask Bark to archive the push.
    pub save: bool,
}

impl Default for BarkCredentials {
    fn default() -> Self {
        Self {
            server: DEFAULT_BARK_SERVER.into(),
            key: None,
            save: false,
        }
    }
}

pub const DEFAULT_BARK_SERVER: &str = "https://api.day.app";

/// Read-only view of the configuration the lifecycle engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Channel names in configured order, duplicates removed.
    pub enabled_channels: Vec<String>,
    /// Allowed hours 0-23, sorted. Empty means every hour.
    pub notification_hours: Vec<u8>,
    pub reminder_mode: ReminderMode,
    pub timezone: String,
    pub telegram: TelegramCredentials,
    pub email: EmailCredentials,
    pub webhook: WebhookCredentials,
    pub bark: BarkCredentials,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled_channels: Vec::new(),
            notification_hours: Vec::new(),
            reminder_mode: ReminderMode::Once,
            timezone: "UTC".into(),
            telegram: TelegramCredentials::default(),
            email: EmailCredentials::default(),
            webhook: WebhookCredentials::default(),
            bark: BarkCredentials::default(),
        }
    }
}

impl NotificationConfig {
    /// Parse the stored config blob.
    pub fn from_json(blob: &str) -> Result<Self> {
        let raw: StoredConfig = serde_json::from_str(blob)?;
        Ok(raw.into())
    }

    /// Whether notifications may go out during `hour` (0-23).
    pub fn is_hour_allowed(&self, hour: u32) -> bool {
        self.notification_hours.is_empty()
            || self.notification_hours.iter().any(|h| u32::from(*h) == hour)
    }
}

/// Shape of the config blob on disk. Unknown keys (admin credentials, JWT
/// secret, ...) are ignored.
#[derive(Debug, Default, Deserialize)]
struct StoredConfig {
    #[serde(rename = "ENABLED_NOTIFIERS", default)]
    enabled_notifiers: serde_json::Value,
    #[serde(rename = "NOTIFICATION_HOURS", default)]
    notification_hours: serde_json::Value,
    #[serde(rename = "REMINDER_MODE", default)]
    reminder_mode: Option<String>,
    #[serde(rename = "TIMEZONE", default)]
    timezone: Option<String>,

    #[serde(rename = "TELEGRAM_BOT_TOKEN", default)]
    telegram_bot_token: Option<String>,
    #[serde(rename = "TG_BOT_TOKEN", default)]
    legacy_telegram_bot_token: Option<String>,
    #[serde(rename = "TELEGRAM_CHAT_ID", default)]
    telegram_chat_id: Option<String>,
    #[serde(rename = "TG_CHAT_ID", default)]
    legacy_telegram_chat_id: Option<String>,

    #[serde(rename = "RESEND_API_KEY", default)]
    resend_api_key: Option<String>,
    #[serde(rename = "EMAIL_FROM", default)]
    email_from: Option<String>,
    #[serde(rename = "EMAIL_FROM_NAME", default)]
    email_from_name: Option<String>,
    #[serde(rename = "EMAIL_TO", default)]
    email_to: Option<String>,

    #[serde(rename = "WEBHOOK_URL", default)]
    webhook_url: Option<String>,
    #[serde(rename = "WEBHOOK_METHOD", default)]
    webhook_method: Option<String>,
    #[serde(rename = "WEBHOOK_HEADERS", default)]
    webhook_headers: Option<String>,
    #[serde(rename = "WEBHOOK_TEMPLATE", default)]
    webhook_template: Option<String>,

    #[serde(rename = "BARK_SERVER", default)]
    bark_server: Option<String>,
    #[serde(rename = "BARK_KEY", default)]
    bark_key: Option<String>,
    #[serde(rename = "BARK_DEVICE_KEY", default)]
    legacy_bark_key: Option<String>,
    #[serde(rename = "BARK_SAVE", default)]
    bark_save: serde_json::Value,
    #[serde(rename = "BARK_IS_ARCHIVE", default)]
    legacy_bark_save: serde_json::Value,
}

impl From<StoredConfig> for NotificationConfig {
    fn from(raw: StoredConfig) -> Self {
        let reminder_mode = match raw.reminder_mode.as_deref().map(str::trim) {
            Some("DAILY") => ReminderMode::Daily,
            Some("ONCE") | None => ReminderMode::Once,
            Some(other) => {
                tracing::warn!("Unknown REMINDER_MODE {other:?}, using ONCE");
                ReminderMode::Once
            }
        };

        Self {
            enabled_channels: normalize_channels(&raw.enabled_notifiers),
            notification_hours: normalize_notification_hours(&raw.notification_hours),
            reminder_mode,
            timezone: non_empty(raw.timezone).unwrap_or_else(|| "UTC".into()),
            telegram: TelegramCredentials {
                bot_token: non_empty(raw.telegram_bot_token)
                    .or_else(|| non_empty(raw.legacy_telegram_bot_token)),
                chat_id: non_empty(raw.telegram_chat_id)
                    .or_else(|| non_empty(raw.legacy_telegram_chat_id)),
            },
            email: EmailCredentials {
                api_key: non_empty(raw.resend_api_key),
                from: non_empty(raw.email_from),
                from_name: non_empty(raw.email_from_name),
                to: non_empty(raw.email_to),
            },
            webhook: WebhookCredentials {
                url: non_empty(raw.webhook_url),
                method: non_empty(raw.webhook_method)
                    .map(|m| m.to_ascii_uppercase())
                    .unwrap_or_else(|| "POST".into()),
                headers: non_empty(raw.webhook_headers),
                template: non_empty(raw.webhook_template),
            },
            bark: BarkCredentials {
                server: non_empty(raw.bark_server).unwrap_or_else(|| DEFAULT_BARK_SERVER.into()),
                key: non_empty(raw.bark_key).or_else(|| non_empty(raw.legacy_bark_key)),
                save: if raw.bark_save.is_null() {
                    truthy(&raw.legacy_bark_save)
                } else {
                    truthy(&raw.bark_save)
                },
            },
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_i64() == Some(1),
        serde_json::Value::String(s) => matches!(s.trim(), "true" | "1"),
        _ => false,
    }
}

fn normalize_channels(value: &serde_json::Value) -> Vec<String> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    let mut channels: Vec<String> = Vec::with_capacity(items.len());
    for name in items.iter().filter_map(|v| v.as_str()).map(str::trim) {
        if !name.is_empty() && !channels.iter().any(|c| c == name) {
            channels.push(name.to_string());
        }
    }
    channels
}

/// Accepts `[]`, `["*"]`, `["ALL"]`, numbers, or numeric strings. Anything
/// outside 0-23 is dropped.
fn normalize_notification_hours(value: &serde_json::Value) -> Vec<u8> {
    let Some(items) = value.as_array() else {
        if !value.is_null() {
            tracing::warn!("Invalid NOTIFICATION_HOURS format: {value}, allowing all hours");
        }
        return Vec::new();
    };
    if items.iter().any(|v| matches!(v.as_str(), Some("*") | Some("ALL"))) {
        return Vec::new();
    }

    let mut hours: Vec<u8> = items
        .iter()
        .filter_map(|v| match v {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
        .filter(|h| (0..=23).contains(h))
        .filter_map(|h| u8::try_from(h).ok())
        .collect();
    hours.sort_unstable();
    hours.dedup();
    hours
}
