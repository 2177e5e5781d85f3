//! Authentication core for authgate
//!
//! This module provides the authentication functionality:
//! - Versioned password hashing and verification
//! - Login with transparent hash migration
//! - Registration validation and creation
//! - Session identity resolution

pub mod manager;
pub mod password;
pub mod session;
pub mod validate;

pub use manager::{AuthConfig, Authenticator, LoginStrategy};
pub use password::{
    hash_password, verify_password, verify_tagged, HashVersion, LegacyHashMethod, LegacyHasher,
    CURRENT_VERSION,
};
pub use session::SessionResolver;
pub use validate::{validate_registration, FieldViolation, MIN_PASSWORD_LENGTH};
