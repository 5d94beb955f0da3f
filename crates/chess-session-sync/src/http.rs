//! HTTP client for the snapshot service.
//!
//! Routes:
//! - `GET /session/{id}?name={key}` → `{"state": string | null}`
//! - `POST /session/{id}` with `{"name", "state"}` → `{"success": true}`
//! - `DELETE /session/{id}?name={key}` → `{"success": true}`
//!
//! Any non-2xx status becomes [`StoreError::Status`] carrying the `error`
//! field of the response body.

use crate::config::SyncConfig;
use crate::store::{SessionId, SnapshotStore, StoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct StateResponse {
    state: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    name: &'a str,
    state: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Snapshot store backed by the snapshot service
#[derive(Debug, Clone)]
pub struct HttpSnapshotStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSnapshotStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    /// Build a client using the configured URL and request timeout
    pub fn from_config(config: &SyncConfig) -> Result<Self, StoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(config.snapshot_url.clone(), builder.build()?))
    }

    fn session_url(&self, session: SessionId) -> String {
        format!("{}/session/{}", self.base_url, session)
    }
}

/// Turn a non-success response into a status error
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(e) => format!("Failed to read error response: {}", e),
    };
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl SnapshotStore for HttpSnapshotStore {
    async fn get(&self, session: SessionId, key: &str) -> Result<Option<String>, StoreError> {
        let response = self
            .client
            .get(self.session_url(session))
            .query(&[("name", key)])
            .send()
            .await?;

        let body: StateResponse = check_status(response).await?.json().await?;
        Ok(body.state)
    }

    async fn put(&self, session: SessionId, key: &str, value: String) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.session_url(session))
            .json(&PutRequest {
                name: key,
                state: &value,
            })
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, session: SessionId, key: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.session_url(session))
            .query(&[("name", key)])
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}
