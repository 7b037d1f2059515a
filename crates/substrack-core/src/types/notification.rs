//! Notification request and result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message to fan out to every enabled channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub title: String,
    pub content: String,
    /// Instant the message describes; also the clock for the quiet-hours gate.
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl NotificationOptions {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            timestamp: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Result of one channel for one dispatch attempt. Always a value, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResult {
    pub channel: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ChannelResult {
    pub fn sent(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            success: true,
            message: Some("sent".into()),
            error: None,
            details: None,
        }
    }

    pub fn failed(channel: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            success: false,
            message: None,
            error: Some(error.into()),
            details: None,
        }
    }

    /// Failure for a channel whose credentials are incomplete.
    pub fn missing_config(channel: impl Into<String>, validation: &ChannelValidation) -> Self {
        Self::failed(
            channel,
            format!("missing configuration: {}", validation.missing_fields.join(", ")),
        )
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Aggregate of one dispatch across all enabled channels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOutcome {
    pub total_channels: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<ChannelResult>,
}

impl NotificationOutcome {
    /// Zero-channel outcome used by the quiet-hours and no-channel gates.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_results(results: Vec<ChannelResult>) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        Self {
            total_channels: results.len(),
            success_count,
            failure_count: results.len() - success_count,
            results,
        }
    }

    /// At least one channel delivered.
    pub fn is_useful(&self) -> bool {
        self.success_count > 0
    }

    /// Channels were attempted and none delivered.
    pub fn is_total_failure(&self) -> bool {
        self.success_count == 0 && self.total_channels > 0
    }
}

/// Credential check for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelValidation {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
}

impl ChannelValidation {
    pub fn from_missing(missing_fields: Vec<String>) -> Self {
        Self {
            is_valid: missing_fields.is_empty(),
            missing_fields,
        }
    }

    /// Collect the names of required fields that are absent.
    pub fn require<'a>(fields: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) -> Self {
        let missing = fields
            .into_iter()
            .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| name.to_string())
            .collect();
        Self::from_missing(missing)
    }
}
