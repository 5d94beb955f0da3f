//! Participant list for a session.

use crate::state::User;
use serde::{Deserialize, Serialize};

/// Ordered list of users, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster(Vec<User>);

impl Roster {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Replace the seat of an existing user in place, or append a new one
    pub fn upsert(&mut self, user: User) {
        match self.0.iter_mut().find(|u| u.name == user.name) {
            Some(existing) => *existing = user,
            None => self.0.push(user),
        }
    }

    /// Remove the user with this name. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|u| u.name != name);
        self.0.len() != before
    }

    pub fn get(&self, name: &str) -> Option<&User> {
        self.0.iter().find(|u| u.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[User] {
        &self.0
    }
}

impl From<Vec<User>> for Roster {
    fn from(users: Vec<User>) -> Self {
        Self(users)
    }
}
