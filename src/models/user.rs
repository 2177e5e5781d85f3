//! User-related domain models
//!
//! This module defines the persisted user record and the ephemeral
//! registration request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account stored in the user store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Unique username
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Hashed password (format depends on `password_version`)
    pub password_hash: String,

    /// Version tag of the hashing scheme that produced `password_hash`
    pub password_version: i64,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Fields for a user record about to be created
///
/// The password is already hashed by the time this struct exists; plaintext
/// never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Username
    pub username: String,

    /// Email address
    pub email: String,

    /// Hashed password
    pub password_hash: String,

    /// Version tag of the hashing scheme
    pub password_version: i64,
}

impl NewUser {
    /// Create a new user record candidate
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        password_version: i64,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            password_version,
        }
    }
}

/// Candidate registration fields submitted by a user
///
/// Validated by the registration procedure and then discarded; never
/// persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistrationRequest {
    /// Requested username
    pub username: String,

    /// Email address
    pub email: String,

    /// Plaintext password
    pub password: String,

    /// Plaintext password confirmation
    pub password_confirm: String,
}

impl RegistrationRequest {
    /// Create a new registration request
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        password_confirm: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            password_confirm: password_confirm.into(),
        }
    }
}
