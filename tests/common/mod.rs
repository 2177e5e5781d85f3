//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use authgate::auth::{AuthConfig, Authenticator, LegacyHashMethod, LegacyHasher, LoginStrategy};
use authgate::database::SqliteUserStore;
use authgate::session::MemorySessionStore;

/// Session key used throughout the integration tests
pub const TEST_SESSION_KEY: &str = "testkey";

/// Create an in-memory user store for testing
pub async fn create_test_store() -> Arc<SqliteUserStore> {
    Arc::new(
        SqliteUserStore::in_memory()
            .await
            .expect("Failed to create test store"),
    )
}

/// Create a fresh session store representing one logical session
pub fn create_test_session() -> Arc<MemorySessionStore> {
    Arc::new(MemorySessionStore::new())
}

/// The legacy keyed hasher the tests configure
pub fn test_legacy_hasher() -> LegacyHasher {
    LegacyHasher::new(LegacyHashMethod::Sha256, "hashkey")
}

/// Create a test authentication configuration
pub fn create_test_auth_config(strategy: LoginStrategy) -> AuthConfig {
    AuthConfig {
        session_key: TEST_SESSION_KEY.to_string(),
        strategy,
        legacy: test_legacy_hasher(),
    }
}

/// Create an authenticator over the given store and session
pub fn create_authenticator(
    store: Arc<SqliteUserStore>,
    session: Arc<MemorySessionStore>,
    strategy: LoginStrategy,
) -> Authenticator<SqliteUserStore, MemorySessionStore> {
    Authenticator::new(store, session, create_test_auth_config(strategy))
}
