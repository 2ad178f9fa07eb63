//! Caredesk REST API
//!
//! This crate provides the Axum-based HTTP API for Caredesk: authentication,
//! user management, appointment scheduling, and medical records.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
