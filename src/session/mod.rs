//! Session storage for authgate
//!
//! A session store holds opaque string values for one logical session. The
//! core only ever stores the authenticated user's identifier under the
//! configured session key; everything else about the session belongs to the
//! enclosing application.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::SessionError;

/// Key-value storage scoped to a single logical session
///
/// Implementations back one session each; a store instance must not be
/// shared across independent sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get the value bound to a key, if any
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Bind a value to a key, replacing any previous binding
    async fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Remove the binding for a key; removing an absent key is not an error
    async fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// In-memory session store
///
/// Suitable for tests and single-process deployments; production setups
/// typically adapt their framework's session facility to [`SessionStore`]
/// instead.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    /// Create an empty session store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let values = self.values.read().unwrap();
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut values = self.values.write().unwrap();
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut values = self.values.write().unwrap();
        values.remove(key);
        Ok(())
    }
}
