//! API routes

mod appointments;
mod auth;
mod health;
mod medical_records;
pub mod types;
mod users;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub use auth::{RequireAdmin, RequireAuth, RequireDoctor};

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(users::routes())
        .merge(appointments::routes())
        .merge(medical_records::routes())
        .with_state(state)
        // Browser dashboards are served from a different origin
        .layer(CorsLayer::permissive())
}
