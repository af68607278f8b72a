//! Credential stores for username/password authentication
//!
//! The authenticator only needs a lookup capability; where the credentials
//! actually live (memory, file, database) is behind the [`CredentialStore`]
//! trait. Implementations must be safe for concurrent use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::net::SocketAddr;

/// Lookup capability consumed by the username/password authenticator.
#[async_trait]
pub trait CredentialStore: Send + Sync + Debug {
    /// Check a username/password pair presented by `peer`.
    async fn validate(&self, username: &str, password: &str, peer: SocketAddr) -> bool;
}

/// In-memory credential store backed by a username → password map.
///
/// An entry with an empty password is a valid account that authenticates
/// with an empty password.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<String, String>,
}

impl StaticCredentials {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user, replacing any existing password
    pub fn insert(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.users.insert(username.into(), password.into());
    }

    /// Number of configured users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the store has no users
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl From<HashMap<String, String>> for StaticCredentials {
    fn from(users: HashMap<String, String>) -> Self {
        StaticCredentials { users }
    }
}

impl FromIterator<(String, String)> for StaticCredentials {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        StaticCredentials {
            users: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn validate(&self, username: &str, password: &str, _peer: SocketAddr) -> bool {
        match self.users.get(username) {
            Some(expected) => expected == password,
            None => false,
        }
    }
}
