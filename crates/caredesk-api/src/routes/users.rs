//! User management routes

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use caredesk_db::{NewUser, UpdateUser};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

use super::auth::{
    RequireAdmin, RequireAuth, parse_role, validate_age, validate_email, validate_name,
    validate_password,
};
use super::types::{CreateUserRequest, ListUsersQuery, UpdateUserRequest, UserResponse};

/// GET /api/users
async fn list_users(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let role = query.role.as_deref().map(parse_role).transpose()?;
    let users = state.db.list_users(role).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/users/{id}
async fn get_user(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    Ok(Json(user.into()))
}

/// POST /api/users (Admin only)
async fn create_user(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_name(&request.name)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    validate_age(request.age)?;
    let role = parse_role(&request.role)?;

    debug!("Creating user: {}", request.email.to_lowercase());

    let password_hash = caredesk_auth::hash_password(&request.password)?;

    let user = state
        .db
        .insert_user(NewUser {
            name: request.name,
            email: request.email,
            password_hash,
            role,
            contact: request.contact,
            age: request.age,
            gender: request.gender,
            specialization: request.specialization,
        })
        .await?;

    info!("Created user {} ({})", user.id, user.role.as_str());

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /api/users/{id} (Admin only)
async fn update_user(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!("Updating user: {}", id);

    if let Some(email) = &request.email {
        validate_email(email)?;
    }
    if let Some(name) = &request.name {
        validate_name(name)?;
    }
    validate_age(request.age)?;
    let role = request.role.as_deref().map(parse_role).transpose()?;

    let user = state
        .db
        .update_user(
            id,
            UpdateUser {
                name: request.name,
                email: request.email,
                role,
                contact: request.contact,
                age: request.age,
                gender: request.gender,
                specialization: request.specialization,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    // Hash only when this write actually carries a new password
    if let Some(password) = &request.password {
        validate_password(password)?;
        let password_hash = caredesk_auth::hash_password(password)?;
        state.db.update_user_password(id, &password_hash).await?;
    }

    info!("Updated user {}", user.id);

    Ok(Json(user.into()))
}

/// DELETE /api/users/{id} (Admin only)
async fn delete_user(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    debug!("Deleting user: {}", id);

    let deleted = state.db.delete_user(id).await?;

    if deleted {
        info!("Deleted user {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("User: {}", id)))
    }
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}", put(update_user))
        .route("/api/users/{id}", delete(delete_user))
}
