//! authgate - user authentication with transparent password-hash migration
//!
//! This crate verifies user credentials against versioned password hashes,
//! migrates records from a legacy keyed-hash scheme to Argon2id at login
//! time, resolves the identity bound to an active session, and validates
//! and creates new user registrations. Persistence and session storage are
//! abstract collaborators supplied by the enclosing application.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod session;
