//! Request and response bodies of the snapshot service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `?name=` query of GET and DELETE
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

/// Body of `POST /session/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutStateRequest {
    pub name: String,
    pub state: String,
}

/// Stored value, `null` when nothing is stored under the name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateResponse {
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Body of `POST /session`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub id: u64,
    pub created_at: DateTime<Utc>,
}
