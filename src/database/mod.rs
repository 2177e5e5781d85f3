//! User store for authgate
//!
//! This module defines the user store trait and its SQLite implementation.

pub mod migrations;
pub mod sqlite;

pub use sqlite::SqliteUserStore;

use async_trait::async_trait;

use crate::error::DbError;
use crate::models::{NewUser, User};

/// User persistence trait
///
/// This trait defines all user-record operations needed by the
/// authentication core. It uses `async_trait` for async methods and
/// `mockall::automock` for testing. Implementations must enforce username
/// and email uniqueness, reporting violations as
/// [`DbError::ConstraintViolation`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user whose username or email equals the identifier
    async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<User>, DbError>;

    /// Find a user by exact username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError>;

    /// Find a user by ID
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError>;

    /// Persist a new user record, returning the stored row
    async fn create(&self, user: &NewUser) -> Result<User, DbError>;

    /// Persist changes to an existing user record
    async fn save(&self, user: &User) -> Result<(), DbError>;
}
