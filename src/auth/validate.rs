//! Registration field validation
//!
//! Validates a candidate registration before any hashing or persistence
//! happens. All rule failures accumulate; a failed validation is a normal
//! outcome, not a fault.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::RegistrationRequest;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Name of the offending field
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl FieldViolation {
    /// Create a new violation
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a registration request
///
/// Returns the full set of violations; an empty vector means the request is
/// acceptable.
pub fn validate_registration(request: &RegistrationRequest) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if request.username.is_empty() {
        violations.push(FieldViolation::new("username", "Username is required"));
    }

    if request.email.is_empty() {
        violations.push(FieldViolation::new("email", "Email is required"));
    } else if !EMAIL_PATTERN.is_match(&request.email) {
        violations.push(FieldViolation::new("email", "Email is not a valid address"));
    }

    if request.password.is_empty() {
        violations.push(FieldViolation::new("password", "Password is required"));
    } else if request.password.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push(FieldViolation::new(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }

    if request.password_confirm.is_empty() {
        violations.push(FieldViolation::new(
            "password_confirm",
            "Password confirmation is required",
        ));
    } else if request.password_confirm != request.password {
        violations.push(FieldViolation::new(
            "password_confirm",
            "The passwords are not the same",
        ));
    }

    violations
}
