//! Versioned password hashing and verification
//!
//! Two hashing schemes coexist, identified by an integer version tag, so the
//! stored-hash format can migrate without invalidating existing credentials:
//!
//! - version 1 ("legacy"): deterministic keyed hash (HMAC) over the plaintext
//!   with a digest and secret taken from configuration, hex-encoded. No
//!   per-password salt; kept only to verify records produced by the old
//!   scheme.
//! - version 2 ("current"): Argon2id with a per-call random salt embedded in
//!   the PHC hash string.
//!
//! New hashes are always produced under the current version. Verification
//! dispatches on the version tag; an unrecognized tag fails closed.

use std::fmt;
use std::str::FromStr;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use sha2::{Sha256, Sha512};

use crate::error::PasswordError;

/// The hashing scheme used for all newly produced hashes
pub const CURRENT_VERSION: HashVersion = HashVersion::Argon2;

/// Closed set of password hashing schemes
///
/// Adding a variant is a deliberate, reviewed change: every `match` on this
/// enum is exhaustive, and integer tags outside the set are rejected by
/// [`HashVersion::from_tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashVersion {
    /// Keyed HMAC hash, hex-encoded (version tag 1)
    LegacyHmac,

    /// Argon2id PHC hash with embedded salt (version tag 2)
    Argon2,
}

impl HashVersion {
    /// The integer tag stored alongside the hash on a user record
    pub fn tag(self) -> i64 {
        match self {
            HashVersion::LegacyHmac => 1,
            HashVersion::Argon2 => 2,
        }
    }

    /// Resolve a stored version tag, rejecting unknown values
    pub fn from_tag(tag: i64) -> Option<Self> {
        match tag {
            1 => Some(HashVersion::LegacyHmac),
            2 => Some(HashVersion::Argon2),
            _ => None,
        }
    }
}

/// Hash a password under the current scheme
///
/// Uses Argon2id with a random salt, so repeated calls on the same input
/// produce distinct hashes. Returns the hash together with the version tag
/// to store next to it.
///
/// # Errors
///
/// Returns an error if hashing fails (should not happen in normal operation)
pub fn hash_password(plain: &str) -> Result<(String, HashVersion), PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| (hash.to_string(), CURRENT_VERSION))
        .map_err(|e| PasswordError::HashFailed(e.to_string()))
}

/// Verify a password against a stored hash of a known version
///
/// Dispatches to the verifier registered for `version`; each scheme's hashes
/// are only ever checked by that scheme's verifier.
pub fn verify_password(
    plain: &str,
    stored: &str,
    version: HashVersion,
    legacy: &LegacyHasher,
) -> bool {
    match version {
        HashVersion::LegacyHmac => legacy.verify(plain, stored),
        HashVersion::Argon2 => verify_argon2(plain, stored),
    }
}

/// Verify a password against a stored hash carrying a raw version tag
///
/// # Errors
///
/// Returns [`PasswordError::UnknownVersion`] for a tag outside the known set.
/// Verification never falls back to a default scheme.
pub fn verify_tagged(
    plain: &str,
    stored: &str,
    tag: i64,
    legacy: &LegacyHasher,
) -> Result<bool, PasswordError> {
    match HashVersion::from_tag(tag) {
        Some(version) => Ok(verify_password(plain, stored, version, legacy)),
        None => Err(PasswordError::UnknownVersion(tag)),
    }
}

fn verify_argon2(plain: &str, stored: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Digest algorithm for the legacy keyed hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyHashMethod {
    /// HMAC-SHA256
    Sha256,
    /// HMAC-SHA512
    Sha512,
}

impl FromStr for LegacyHashMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(LegacyHashMethod::Sha256),
            "sha512" => Ok(LegacyHashMethod::Sha512),
            other => Err(format!("Unsupported legacy hash method: {}", other)),
        }
    }
}

impl fmt::Display for LegacyHashMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyHashMethod::Sha256 => write!(f, "sha256"),
            LegacyHashMethod::Sha512 => write!(f, "sha512"),
        }
    }
}

/// Legacy keyed-hash scheme (version 1)
///
/// Deterministic: the same plaintext with the same method and secret always
/// yields the same hex digest. That property is what the old scheme's stored
/// hashes rely on, and also why it is never used for new hashes.
#[derive(Debug, Clone)]
pub struct LegacyHasher {
    method: LegacyHashMethod,
    secret: String,
}

impl LegacyHasher {
    /// Create a legacy hasher from the configured method and secret
    pub fn new(method: LegacyHashMethod, secret: impl Into<String>) -> Self {
        Self {
            method,
            secret: secret.into(),
        }
    }

    /// Compute the hex-encoded keyed hash of a plaintext
    ///
    /// # Errors
    ///
    /// Returns an error if the MAC cannot be keyed (should not happen in
    /// normal operation)
    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let digest = match self.method {
            LegacyHashMethod::Sha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
                    .map_err(|e| PasswordError::HashFailed(e.to_string()))?;
                mac.update(plain.as_bytes());
                mac.finalize().into_bytes().to_vec()
            }
            LegacyHashMethod::Sha512 => {
                let mut mac = Hmac::<Sha512>::new_from_slice(self.secret.as_bytes())
                    .map_err(|e| PasswordError::HashFailed(e.to_string()))?;
                mac.update(plain.as_bytes());
                mac.finalize().into_bytes().to_vec()
            }
        };

        Ok(hex::encode(digest))
    }

    /// Verify a plaintext against a stored hex digest in constant time
    pub fn verify(&self, plain: &str, stored: &str) -> bool {
        let Ok(expected) = hex::decode(stored) else {
            return false;
        };

        match self.method {
            LegacyHashMethod::Sha256 => {
                let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes()) else {
                    return false;
                };
                mac.update(plain.as_bytes());
                mac.verify_slice(&expected).is_ok()
            }
            LegacyHashMethod::Sha512 => {
                let Ok(mut mac) = Hmac::<Sha512>::new_from_slice(self.secret.as_bytes()) else {
                    return false;
                };
                mac.update(plain.as_bytes());
                mac.verify_slice(&expected).is_ok()
            }
        }
    }
}
