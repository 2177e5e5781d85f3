//! Authentication manager
//!
//! This module provides the main authentication interface: logging a user in
//! under one of two credential-matching strategies, registering new users,
//! and handing out per-session identity resolvers.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::password::{hash_password, verify_tagged, LegacyHasher, CURRENT_VERSION};
use crate::auth::session::SessionResolver;
use crate::auth::validate::{validate_registration, FieldViolation};
use crate::config::{Config, ConfigError};
use crate::database::UserStore;
use crate::error::{AuthError, DbError};
use crate::models::{NewUser, RegistrationRequest};
use crate::session::SessionStore;

/// Credential-matching strategy used by [`Authenticator::login`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginStrategy {
    /// Look up by username or email and verify through version dispatch,
    /// upgrading legacy hashes in place on success
    #[default]
    VerifiedHash,

    /// Look up by username and compare the stored hash against the legacy
    /// keyed hash of the supplied password; no version dispatch, no upgrade
    LegacyEquality,
}

impl FromStr for LoginStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verified_hash" => Ok(LoginStrategy::VerifiedHash),
            "legacy_equality" => Ok(LoginStrategy::LegacyEquality),
            other => Err(format!("Unknown login strategy: {}", other)),
        }
    }
}

/// Configuration for the authentication manager
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session key under which the authenticated user id is stored
    pub session_key: String,

    /// Credential-matching strategy for `login`
    pub strategy: LoginStrategy,

    /// Legacy keyed-hash scheme for version-1 records
    pub legacy: LegacyHasher,
}

impl AuthConfig {
    /// Build the runtime configuration from the loaded [`Config`]
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let method = config
            .legacy_hash
            .method
            .parse()
            .map_err(ConfigError::Parse)?;

        Ok(Self {
            session_key: config.auth.session_key.clone(),
            strategy: config.auth.strategy,
            legacy: LegacyHasher::new(method, config.legacy_hash.secret.clone()),
        })
    }
}

/// Authentication manager
///
/// Provides login and registration over an abstract user store and a
/// session store scoped to the current logical session. Expected negative
/// outcomes (unknown user, wrong password, validation failures) are ordinary
/// return values; store faults propagate as errors.
pub struct Authenticator<S: UserStore, K: SessionStore> {
    users: Arc<S>,
    sessions: Arc<K>,
    config: AuthConfig,
}

impl<S: UserStore, K: SessionStore> Authenticator<S, K> {
    /// Create a new authentication manager
    pub fn new(users: Arc<S>, sessions: Arc<K>, config: AuthConfig) -> Self {
        Self {
            users,
            sessions,
            config,
        }
    }

    /// Try to log the user in using the configured strategy
    ///
    /// Returns `Ok(true)` on success and `Ok(false)` when the identifier
    /// matches no user or the password is wrong; the two cases are
    /// indistinguishable by design.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<bool, AuthError> {
        match self.config.strategy {
            LoginStrategy::VerifiedHash => self.login_verified(identifier, password).await,
            LoginStrategy::LegacyEquality => self.login_legacy_equality(identifier, password).await,
        }
    }

    /// Log in by identifier with version-dispatched verification
    ///
    /// Looks up a user whose username or email equals `identifier` and
    /// verifies the password against the stored hash under the scheme its
    /// version tag names. On success the session is bound to the user id
    /// and, if the stored hash predates the current scheme, the password is
    /// re-hashed and persisted inline. A failed upgrade write is an error,
    /// not a silent skip.
    pub async fn login_verified(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<bool, AuthError> {
        let Some(mut user) = self.users.find_by_username_or_email(identifier).await? else {
            // Burn one current-scheme hash so the miss path costs about as
            // much as a failed verification.
            let _ = hash_password(password);
            return Ok(false);
        };

        let correct = match verify_tagged(
            password,
            &user.password_hash,
            user.password_version,
            &self.config.legacy,
        ) {
            Ok(correct) => correct,
            Err(err) => {
                warn!(
                    user_id = user.id,
                    version = user.password_version,
                    "Stored password hash has an unsupported version"
                );
                return Err(err.into());
            }
        };

        if !correct {
            return Ok(false);
        }

        self.sessions
            .set(&self.config.session_key, &user.id.to_string())
            .await?;

        if user.password_version != CURRENT_VERSION.tag() {
            let (new_hash, new_version) = hash_password(password)?;
            user.password_hash = new_hash;
            user.password_version = new_version.tag();
            self.users.save(&user).await?;
            debug!(user_id = user.id, "Upgraded password hash to current scheme");
        }

        Ok(true)
    }

    /// Log in by username with precomputed legacy-hash equality
    ///
    /// The stored hash is compared against the legacy keyed hash of the
    /// supplied password. This historical variant has no upgrade path.
    pub async fn login_legacy_equality(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<bool, AuthError> {
        let Some(user) = self.users.find_by_username(identifier).await? else {
            // Keep the miss path doing the same keyed-hash work.
            let _ = self.config.legacy.hash(password);
            return Ok(false);
        };

        if !self.config.legacy.verify(password, &user.password_hash) {
            return Ok(false);
        }

        self.sessions
            .set(&self.config.session_key, &user.id.to_string())
            .await?;

        Ok(true)
    }

    /// Register a new user from the given request
    ///
    /// Returns the list of field violations; an empty list signals success.
    /// A uniqueness rejection from the store joins the violation list, while
    /// any other store fault propagates as an error and leaves no record
    /// behind.
    pub async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<Vec<FieldViolation>, AuthError> {
        let violations = validate_registration(request);
        if !violations.is_empty() {
            return Ok(violations);
        }

        let (hash, version) = hash_password(&request.password)?;
        let new_user = NewUser::new(
            request.username.clone(),
            request.email.clone(),
            hash,
            version.tag(),
        );

        match self.users.create(&new_user).await {
            Ok(user) => {
                debug!(user_id = user.id, "Registered new user");
                Ok(Vec::new())
            }
            Err(DbError::ConstraintViolation(constraint)) => {
                Ok(vec![constraint_to_violation(&constraint)])
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Create an identity resolver for the current logical session
    ///
    /// One resolver per session: it memoizes its lookup and must not be
    /// reused across independent sessions.
    pub fn resolver(&self) -> SessionResolver<S, K> {
        SessionResolver::new(
            Arc::clone(&self.users),
            Arc::clone(&self.sessions),
            self.config.session_key.clone(),
        )
    }
}

fn constraint_to_violation(constraint: &str) -> FieldViolation {
    if constraint.contains("email") {
        FieldViolation::new("email", "Email is already taken")
    } else if constraint.contains("username") {
        FieldViolation::new("username", "Username is already taken")
    } else {
        FieldViolation::new("user", format!("Could not create user: {}", constraint))
    }
}
