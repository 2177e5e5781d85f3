//! Session identity resolution
//!
//! Maps the current session to a concrete user record. One resolver is
//! scoped to one logical session: it memoizes its lookup (including a
//! not-found result) so repeated calls are cheap, and must be recreated
//! rather than reused across independent sessions.

use std::sync::Arc;

use tracing::warn;

use crate::database::UserStore;
use crate::error::AuthError;
use crate::models::User;
use crate::session::SessionStore;

/// Resolves "who is the current actor" from session state
pub struct SessionResolver<S: UserStore, K: SessionStore> {
    users: Arc<S>,
    sessions: Arc<K>,
    session_key: String,
    cached: Option<Option<User>>,
}

impl<S: UserStore, K: SessionStore> SessionResolver<S, K> {
    /// Create a resolver for the current logical session
    pub fn new(users: Arc<S>, sessions: Arc<K>, session_key: impl Into<String>) -> Self {
        Self {
            users,
            sessions,
            session_key: session_key.into(),
            cached: None,
        }
    }

    /// Get the currently logged in user, if any
    ///
    /// The first call reads the session binding and looks the user up; the
    /// result is memoized for the resolver's lifetime. A binding that does
    /// not parse as a user id resolves to no user.
    pub async fn current_user(&mut self) -> Result<Option<User>, AuthError> {
        if let Some(cached) = &self.cached {
            return Ok(cached.clone());
        }

        let resolved = match self.sessions.get(&self.session_key).await? {
            None => None,
            Some(value) => match value.parse::<i64>() {
                Ok(id) => self.users.find_by_id(id).await?,
                Err(_) => {
                    warn!(
                        session_key = %self.session_key,
                        "Session binding is not a user id"
                    );
                    None
                }
            },
        };

        self.cached = Some(resolved.clone());
        Ok(resolved)
    }

    /// Check if a user is logged in
    pub async fn is_authenticated(&mut self) -> Result<bool, AuthError> {
        Ok(self.current_user().await?.is_some())
    }

    /// Log out the current user
    ///
    /// Removes the session binding and clears the memoized identity,
    /// whether or not one was present.
    pub async fn logout(&mut self) -> Result<(), AuthError> {
        self.sessions.remove(&self.session_key).await?;
        self.cached = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MockUserStore;
    use crate::error::SessionError;
    use crate::session::MockSessionStore;
    use chrono::Utc;

    fn stored_user(id: i64) -> User {
        User {
            id,
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password_hash: "hash".to_string(),
            password_version: 2,
            created_at: Utc::now(),
        }
    }

    fn resolver(
        users: MockUserStore,
        sessions: MockSessionStore,
    ) -> SessionResolver<MockUserStore, MockSessionStore> {
        SessionResolver::new(Arc::new(users), Arc::new(sessions), "auth_user_id")
    }

    // Test 1: no session binding resolves to no user, without a store lookup
    #[tokio::test]
    async fn test_no_session_binding() {
        let users = MockUserStore::new();
        let mut sessions = MockSessionStore::new();
        sessions.expect_get().times(1).returning(|_| Ok(None));

        let mut resolver = resolver(users, sessions);
        assert!(resolver.current_user().await.unwrap().is_none());
        assert!(!resolver.is_authenticated().await.unwrap());

        // The second call above hit the memo: expect_get allows one call only.
    }

    // Test 2: a bound session resolves to the stored user and memoizes
    #[tokio::test]
    async fn test_resolves_bound_user() {
        let mut users = MockUserStore::new();
        users
            .expect_find_by_id()
            .withf(|id| *id == 7)
            .times(1)
            .returning(|id| Ok(Some(stored_user(id))));

        let mut sessions = MockSessionStore::new();
        sessions
            .expect_get()
            .withf(|key| key == "auth_user_id")
            .times(1)
            .returning(|_| Ok(Some("7".to_string())));

        let mut resolver = resolver(users, sessions);
        let first = resolver.current_user().await.unwrap().unwrap();
        assert_eq!(first.id, 7);

        let second = resolver.current_user().await.unwrap().unwrap();
        assert_eq!(second, first);
        assert!(resolver.is_authenticated().await.unwrap());
    }

    // Test 3: a dangling binding memoizes the not-found result too
    #[tokio::test]
    async fn test_memoizes_not_found() {
        let mut users = MockUserStore::new();
        users
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let mut sessions = MockSessionStore::new();
        sessions
            .expect_get()
            .times(1)
            .returning(|_| Ok(Some("99".to_string())));

        let mut resolver = resolver(users, sessions);
        assert!(resolver.current_user().await.unwrap().is_none());
        assert!(resolver.current_user().await.unwrap().is_none());
    }

    // Test 4: an unparsable binding resolves to no user, without a lookup
    #[tokio::test]
    async fn test_unparsable_binding() {
        let users = MockUserStore::new();
        let mut sessions = MockSessionStore::new();
        sessions
            .expect_get()
            .returning(|_| Ok(Some("not-a-number".to_string())));

        let mut resolver = resolver(users, sessions);
        assert!(resolver.current_user().await.unwrap().is_none());
    }

    // Test 5: logout removes the binding and clears the memo
    #[tokio::test]
    async fn test_logout_clears_binding_and_memo() {
        let mut users = MockUserStore::new();
        users
            .expect_find_by_id()
            .times(1)
            .returning(|id| Ok(Some(stored_user(id))));

        let mut sessions = MockSessionStore::new();
        let mut get_calls = 0;
        sessions.expect_get().times(2).returning(move |_| {
            get_calls += 1;
            if get_calls == 1 {
                Ok(Some("7".to_string()))
            } else {
                Ok(None)
            }
        });
        sessions
            .expect_remove()
            .withf(|key| key == "auth_user_id")
            .times(1)
            .returning(|_| Ok(()));

        let mut resolver = resolver(users, sessions);
        assert!(resolver.is_authenticated().await.unwrap());

        resolver.logout().await.unwrap();
        assert!(!resolver.is_authenticated().await.unwrap());
    }

    // Test 6: logout with no session bound is fine
    #[tokio::test]
    async fn test_logout_idempotent() {
        let users = MockUserStore::new();
        let mut sessions = MockSessionStore::new();
        sessions.expect_remove().times(2).returning(|_| Ok(()));

        let mut resolver = resolver(users, sessions);
        resolver.logout().await.unwrap();
        resolver.logout().await.unwrap();
    }

    // Test 7: session store faults propagate
    #[tokio::test]
    async fn test_session_fault_propagates() {
        let users = MockUserStore::new();
        let mut sessions = MockSessionStore::new();
        sessions
            .expect_get()
            .returning(|_| Err(SessionError::Backend("down".to_string())));

        let mut resolver = resolver(users, sessions);
        let result = resolver.current_user().await;
        assert!(matches!(result, Err(AuthError::Session(_))));
    }
}
