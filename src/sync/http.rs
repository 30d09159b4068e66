/// REST client for the remote user store.
///
/// Endpoints (relative to the configured base URL):
///   POST  /users/{id}/increments   {"field": "points" | "totalFeedings", "by": n}
///   PATCH /users/{id}              {"displayName": "..."}
///
/// An optional bearer token is sent with every request. The user id is
/// pushed as a single percent-encoded path segment, so `/`, `?` and `#` in
/// an id can never address another document.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;

use super::{RemoteSync, SyncError, SyncResult};

pub const FIELD_POINTS: &str = "points";
pub const FIELD_TOTAL_FEEDINGS: &str = "totalFeedings";

#[derive(Debug, Serialize)]
struct IncrementRequest<'a> {
    field: &'a str,
    by: u64,
}

#[derive(Debug, Serialize)]
struct DisplayNameRequest<'a> {
    #[serde(rename = "displayName")]
    display_name: &'a str,
}

pub struct HttpRemoteSync {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpRemoteSync {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(SyncError::InvalidConfig("base URL is empty".to_string()));
        }
        let parsed = Url::parse(trimmed)
            .map_err(|e| SyncError::InvalidConfig(format!("{}: {}", trimmed, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(SyncError::InvalidConfig(format!("{}: not a base URL", trimmed)));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: parsed,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// URL of a user document.
    pub fn user_url(&self, user_id: &str) -> Result<Url, SyncError> {
        self.document_url(user_id, None)
    }

    fn document_url(&self, user_id: &str, suffix: Option<&str>) -> Result<Url, SyncError> {
        // Dot segments are dropped by the path builder rather than encoded.
        if matches!(user_id, "" | "." | "..") {
            return Err(SyncError::InvalidUserId(user_id.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidConfig("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("users")
            .push(user_id)
            .extend(suffix);
        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> SyncResult {
        let response = self
            .authorized(request)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::Http(response.status().as_u16()));
        }
        Ok(())
    }

    async fn increment(&self, user_id: &str, field: &str, by: u64) -> SyncResult {
        let url = self.document_url(user_id, Some("increments"))?;
        self.send(self.client.post(url).json(&IncrementRequest { field, by }))
            .await
    }
}

#[async_trait]
impl RemoteSync for HttpRemoteSync {
    async fn increment_points(&self, user_id: &str, amount: u64) -> SyncResult {
        self.increment(user_id, FIELD_POINTS, amount).await
    }

    async fn increment_feedings(&self, user_id: &str, by: u64) -> SyncResult {
        self.increment(user_id, FIELD_TOTAL_FEEDINGS, by).await
    }

    async fn set_display_name(&self, user_id: &str, display_name: &str) -> SyncResult {
        let url = self.user_url(user_id)?;
        self.send(self.client.patch(url).json(&DisplayNameRequest { display_name }))
            .await
    }
}
