//! SQLite implementation of the UserStore trait
//!
//! This module provides a SQLite-based implementation of the UserStore trait
//! using rusqlite and tokio-rusqlite for async operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use super::migrations::CREATE_SCHEMA;
use super::UserStore;
use crate::error::DbError;
use crate::models::{NewUser, User};

/// SQLite user store implementation
pub struct SqliteUserStore {
    conn: Connection,
}

impl SqliteUserStore {
    /// Create a new SQLite user store
    ///
    /// Use `:memory:` for an in-memory database or a file path for
    /// persistent storage.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let conn = Connection::open(path).await.map_err(map_store_err)?;

        // Run migrations
        conn.call(|conn| {
            conn.execute_batch(CREATE_SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(map_store_err)?;

        Ok(Self { conn })
    }

    /// Create a new in-memory user store (useful for testing)
    pub async fn in_memory() -> Result<Self, DbError> {
        Self::new(":memory:").await
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<User>, DbError> {
        let identifier = identifier.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, username, email, password_hash, password_version, created_at
                    FROM users
                    WHERE username = ?1 OR email = ?1
                    LIMIT 1
                    "#,
                )?;

                let user = stmt.query_row([&identifier], row_to_user).optional()?;
                Ok(user)
            })
            .await
            .map_err(map_store_err)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let username = username.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, username, email, password_hash, password_version, created_at
                    FROM users
                    WHERE username = ?1
                    LIMIT 1
                    "#,
                )?;

                let user = stmt.query_row([&username], row_to_user).optional()?;
                Ok(user)
            })
            .await
            .map_err(map_store_err)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, username, email, password_hash, password_version, created_at
                    FROM users
                    WHERE id = ?1
                    "#,
                )?;

                let user = stmt.query_row([id], row_to_user).optional()?;
                Ok(user)
            })
            .await
            .map_err(map_store_err)
    }

    async fn create(&self, user: &NewUser) -> Result<User, DbError> {
        let username = user.username.clone();
        let email = user.email.clone();
        let password_hash = user.password_hash.clone();
        let password_version = user.password_version;

        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO users (username, email, password_hash, password_version)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                    rusqlite::params![username, email, password_hash, password_version],
                )?;

                let id = conn.last_insert_rowid();
                let user = conn.query_row(
                    r#"
                    SELECT id, username, email, password_hash, password_version, created_at
                    FROM users
                    WHERE id = ?1
                    "#,
                    [id],
                    row_to_user,
                )?;

                Ok(user)
            })
            .await
            .map_err(map_store_err)
    }

    async fn save(&self, user: &User) -> Result<(), DbError> {
        let id = user.id;
        let username = user.username.clone();
        let email = user.email.clone();
        let password_hash = user.password_hash.clone();
        let password_version = user.password_version;

        let updated = self
            .conn
            .call(move |conn| {
                let count = conn.execute(
                    r#"
                    UPDATE users
                    SET username = ?1, email = ?2, password_hash = ?3, password_version = ?4
                    WHERE id = ?5
                    "#,
                    rusqlite::params![username, email, password_hash, password_version, id],
                )?;
                Ok(count)
            })
            .await
            .map_err(map_store_err)?;

        if updated == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        password_version: row.get(4)?,
        created_at: parse_datetime(row.get::<_, Option<String>>(5)?),
    })
}

fn parse_datetime(value: Option<String>) -> DateTime<Utc> {
    value
        .and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                        .ok()
                        .map(|naive| naive.and_utc())
                })
        })
        .unwrap_or_else(Utc::now)
}

fn map_store_err(err: tokio_rusqlite::Error) -> DbError {
    match err {
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::ConstraintViolation(msg.unwrap_or_else(|| "constraint failed".to_string()))
        }
        other => DbError::Sqlite(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user(username: &str, email: &str) -> (SqliteUserStore, User) {
        let store = SqliteUserStore::in_memory().await.unwrap();
        let user = store
            .create(&NewUser::new(username, email, "stored-hash", 2))
            .await
            .unwrap();
        (store, user)
    }

    // Test 1: create assigns an id and echoes the stored fields
    #[tokio::test]
    async fn test_create_and_fetch() {
        let (store, created) = store_with_user("alice", "alice@example.com").await;

        assert!(created.id > 0);
        assert_eq!(created.username, "alice");
        assert_eq!(created.password_version, 2);

        let fetched = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    // Test 2: lookup by username or email matches either column
    #[tokio::test]
    async fn test_find_by_username_or_email() {
        let (store, created) = store_with_user("alice", "alice@example.com").await;

        let by_name = store.find_by_username_or_email("alice").await.unwrap();
        assert_eq!(by_name.as_ref().map(|u| u.id), Some(created.id));

        let by_email = store
            .find_by_username_or_email("alice@example.com")
            .await
            .unwrap();
        assert_eq!(by_email.as_ref().map(|u| u.id), Some(created.id));

        let missing = store.find_by_username_or_email("nobody").await.unwrap();
        assert!(missing.is_none());
    }

    // Test 3: find_by_username does not match email addresses
    #[tokio::test]
    async fn test_find_by_username_exact() {
        let (store, _) = store_with_user("alice", "alice@example.com").await;

        assert!(store.find_by_username("alice").await.unwrap().is_some());
        assert!(store
            .find_by_username("alice@example.com")
            .await
            .unwrap()
            .is_none());
    }

    // Test 4: duplicate username is a constraint violation
    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (store, _) = store_with_user("alice", "alice@example.com").await;

        let result = store
            .create(&NewUser::new("alice", "other@example.com", "hash", 2))
            .await;
        match result {
            Err(DbError::ConstraintViolation(msg)) => assert!(msg.contains("username")),
            other => panic!("Expected ConstraintViolation, got {:?}", other.map(|u| u.id)),
        }
    }

    // Test 5: duplicate email is a constraint violation
    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (store, _) = store_with_user("alice", "alice@example.com").await;

        let result = store
            .create(&NewUser::new("bob", "alice@example.com", "hash", 2))
            .await;
        match result {
            Err(DbError::ConstraintViolation(msg)) => assert!(msg.contains("email")),
            other => panic!("Expected ConstraintViolation, got {:?}", other.map(|u| u.id)),
        }
    }

    // Test 6: save persists hash and version changes
    #[tokio::test]
    async fn test_save_updates_record() {
        let (store, mut user) = store_with_user("alice", "alice@example.com").await;

        user.password_hash = "new-hash".to_string();
        user.password_version = 2;
        store.save(&user).await.unwrap();

        let fetched = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.password_hash, "new-hash");
        assert_eq!(fetched.password_version, 2);
    }

    // Test 7: saving a nonexistent record reports NotFound
    #[tokio::test]
    async fn test_save_missing_record() {
        let store = SqliteUserStore::in_memory().await.unwrap();
        let ghost = User {
            id: 12345,
            username: "ghost".to_string(),
            email: "ghost@example.com".to_string(),
            password_hash: "hash".to_string(),
            password_version: 2,
            created_at: Utc::now(),
        };

        let result = store.save(&ghost).await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    // Test 8: stored timestamps parse back to a concrete time
    #[tokio::test]
    async fn test_created_at_parses() {
        let (_, created) = store_with_user("alice", "alice@example.com").await;
        let age = Utc::now().signed_duration_since(created.created_at);
        assert!(age.num_minutes().abs() < 5);
    }
}
