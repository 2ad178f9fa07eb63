//! Authentication error types
//!
//! These never reach the wire directly; the API layer folds them into its own
//! error type and response shape.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Covers malformed, expired, and tampered tokens alike; callers must not
    /// be able to tell which check failed.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}
