//! Stored data of one board session.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Named snapshot strings of a session
#[derive(Debug, Clone)]
pub struct SessionData {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    data: HashMap<String, String>,
}

impl SessionData {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            data: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.data.get(name).map(String::as_str)
    }

    pub fn put(&mut self, name: String, state: String) {
        self.data.insert(name, state);
    }

    /// Returns whether a value was removed
    pub fn remove(&mut self, name: &str) -> bool {
        self.data.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
