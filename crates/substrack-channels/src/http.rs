//! Response helpers shared by the HTTP adapters.

use reqwest::StatusCode;
use substrack_core::error::{Result, SubsTrackError};

/// A provider reply: status plus the body, decoded as JSON when possible.
pub(crate) struct Reply {
    pub status: StatusCode,
    pub json: Option<serde_json::Value>,
    pub text: String,
}

impl Reply {
    pub async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SubsTrackError::Http(format!("failed to read response body: {e}")))?;
        let json = serde_json::from_str(&text).ok();
        Ok(Self { status, json, text })
    }

    /// The JSON body, or an error when the provider answered with something else.
    pub fn require_json(&self) -> Result<&serde_json::Value> {
        self.json.as_ref().ok_or_else(|| {
            SubsTrackError::Http(format!("HTTP {}: response is not JSON", self.status.as_u16()))
        })
    }

    /// String field of the JSON body, falling back to `HTTP <status>`.
    pub fn error_text(&self, field: &str) -> String {
        self.json
            .as_ref()
            .and_then(|j| j[field].as_str())
            .map(String::from)
            .unwrap_or_else(|| format!("HTTP {}", self.status.as_u16()))
    }
}
