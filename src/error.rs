//! Application error types for authgate
//!
//! This module defines common error types used throughout the crate.
//! All error types use `thiserror` for ergonomic error handling.
//!
//! Expected negative outcomes (wrong password, unknown user, validation
//! failures) are ordinary return values and never appear here.

use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PasswordError {
    /// Hashing failed
    #[error("Hash failed: {0}")]
    HashFailed(String),

    /// Stored hash carries a version tag no verifier is registered for
    #[error("Unknown password hash version: {0}")]
    UnknownVersion(i64),
}

/// User store errors
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite error
    #[error("Database error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),

    /// Record not found
    #[error("Record not found")]
    NotFound,

    /// Constraint violation (e.g. duplicate username or email)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Session store errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    /// Backend failure (connectivity, serialization)
    #[error("Session backend error: {0}")]
    Backend(String),
}

/// Top-level error type for authentication operations
///
/// Aggregates the domain-specific error types. Store and session faults
/// propagate through here unmodified; the core neither masks nor retries
/// them.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Password hashing or verification fault
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    /// User store fault
    #[error("Store error: {0}")]
    Store(#[from] DbError),

    /// Session store fault
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}
