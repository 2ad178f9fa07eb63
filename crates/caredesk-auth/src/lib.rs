//! Caredesk Authentication and Authorization
//!
//! This crate provides password hashing, JWT-based authentication, and
//! role-based access control for Caredesk.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use error::AuthError;
pub use jwt::{Claims, JwtManager};
pub use middleware::{AuthUser, authorize, extract_bearer_token};
pub use password::{hash_password, verify_password};
