//! Client configuration read from the environment.
//!
//! | Variable             | Default                 |
//! |----------------------|-------------------------|
//! | `SNAPSHOT_URL`       | `http://127.0.0.1:8080` |
//! | `SESSION_ID`         | required                |
//! | `SYNC_INTERVAL_MS`   | `2000`                  |
//! | `REQUEST_TIMEOUT_MS` | unset (transport default) |

use crate::store::SessionId;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SNAPSHOT_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub snapshot_url: String,
    pub session_id: SessionId,
    pub poll_interval: Duration,
    pub request_timeout: Option<Duration>,
}

impl SyncConfig {
    pub fn new(snapshot_url: impl Into<String>, session_id: SessionId) -> Self {
        Self {
            snapshot_url: snapshot_url.into(),
            session_id,
            poll_interval: DEFAULT_SYNC_INTERVAL,
            request_timeout: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let snapshot_url = lookup("SNAPSHOT_URL").unwrap_or_else(|| DEFAULT_SNAPSHOT_URL.into());

        let raw_id = lookup("SESSION_ID").ok_or(ConfigError::Missing("SESSION_ID"))?;
        let session_id = raw_id.parse().map_err(|_| ConfigError::Invalid {
            name: "SESSION_ID",
            value: raw_id.clone(),
        })?;

        let poll_interval = match lookup("SYNC_INTERVAL_MS") {
            Some(raw) => parse_millis("SYNC_INTERVAL_MS", &raw)?,
            None => DEFAULT_SYNC_INTERVAL,
        };

        let request_timeout = lookup("REQUEST_TIMEOUT_MS")
            .map(|raw| parse_millis("REQUEST_TIMEOUT_MS", &raw))
            .transpose()?;

        Ok(Self {
            snapshot_url,
            session_id,
            poll_interval,
            request_timeout,
        })
    }
}

/// Positive number of milliseconds
fn parse_millis(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
        }),
    }
}
