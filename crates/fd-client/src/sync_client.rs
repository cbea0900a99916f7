//! HTTP implementation of the identity sync call

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::identity::{SyncClient, SyncRequest, SyncResponse};

pub const SYNC_PATH: &str = "/api/auth/sync";

/// Posts the sync payload to `{base_url}/api/auth/sync`
pub struct HttpSyncClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpSyncClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, SYNC_PATH)
    }
}

#[async_trait]
impl SyncClient for HttpSyncClient {
    async fn sync(&self, request: &SyncRequest, token: Option<&str>) -> Result<SyncResponse> {
        let mut builder = self.http_client.post(self.endpoint()).json(request);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!(status = %status, "Sync endpoint responded");

        if status.is_success() {
            return Ok(response.json::<SyncResponse>().await?);
        }

        // Error bodies usually carry {error} or {message}
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let reason = body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP error: {}", status));
        Err(ClientError::SyncRejected(reason))
    }
}
