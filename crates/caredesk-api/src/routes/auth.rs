//! Authentication extractors and routes

use axum::{
    Router,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    routing::{get, post},
};
use caredesk_auth::{AuthUser, extract_bearer_token, verify_password};
use caredesk_db::{NewUser, Role};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

use super::types::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};

// ==================== Auth Extractors ====================

/// Extractor for authenticated user (required)
///
/// Validates the bearer token and resolves the subject against the users
/// table. A token that outlives its user authenticates as nobody: the lookup
/// miss is an authentication failure, never stale identity data. The attached
/// user carries the live record's name and role.
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = extract_bearer_token(auth_header).map_err(|_| ApiError::Unauthorized)?;
        let claims = app_state
            .jwt
            .validate_token(token)
            .map_err(|_| ApiError::Unauthorized)?;
        let claimed = AuthUser::from_claims(&claims).map_err(|_| ApiError::Unauthorized)?;

        let user = app_state
            .db
            .get_user_by_id(claimed.id)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        debug!("Authenticated user: {} ({})", user.id, user.role.as_str());

        Ok(RequireAuth(AuthUser {
            id: user.id,
            name: user.name,
            role: user.role,
        }))
    }
}

/// Extractor for admin user (required)
pub struct RequireAdmin(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        caredesk_auth::authorize(&user, &[Role::Admin]).map_err(|_| ApiError::Forbidden)?;
        Ok(RequireAdmin(user))
    }
}

/// Extractor for doctor user (required)
pub struct RequireDoctor(pub AuthUser);

impl<S> FromRequestParts<S> for RequireDoctor
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        caredesk_auth::authorize(&user, &[Role::Doctor]).map_err(|_| ApiError::Forbidden)?;
        Ok(RequireDoctor(user))
    }
}

// ==================== Input Validation ====================

/// Maximum allowed name/email length
const MAX_FIELD_LENGTH: usize = 128;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 6;

pub(super) fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("Name cannot be empty".to_string()));
    }
    if name.len() > MAX_FIELD_LENGTH {
        return Err(ApiError::Validation(format!(
            "Name exceeds maximum length of {} characters",
            MAX_FIELD_LENGTH
        )));
    }
    Ok(())
}

pub(super) fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(ApiError::Validation(
            "Please provide a valid email".to_string(),
        ));
    }
    if email.len() > MAX_FIELD_LENGTH {
        return Err(ApiError::Validation(format!(
            "Email exceeds maximum length of {} characters",
            MAX_FIELD_LENGTH
        )));
    }
    Ok(())
}

pub(super) fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub(super) fn validate_age(age: Option<i64>) -> Result<(), ApiError> {
    if age.is_some_and(|a| a < 0) {
        return Err(ApiError::Validation("Age cannot be negative".to_string()));
    }
    Ok(())
}

pub(super) fn parse_role(role: &str) -> Result<Role, ApiError> {
    Role::from_str(role).map_err(|_| ApiError::Validation(format!("Invalid role: {}", role)))
}

// ==================== Auth Routes ====================

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    validate_name(&request.name)?;
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    validate_age(request.age)?;

    let role = match request.role.as_deref() {
        Some(r) => parse_role(r)?,
        None => Role::Patient,
    };

    debug!("Registering user: {}", request.email.to_lowercase());

    // The plaintext enters the hasher exactly once, here
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

    let token = state
        .jwt
        .generate_token(user.id, &user.name, user.role.as_str())?;

    info!("Registered user {} ({})", user.id, user.role.as_str());

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            expires_in: state.jwt.expiry_secs(),
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    validate_email(&request.email)?;
    if request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }

    debug!("Login attempt for: {}", request.email.to_lowercase());

    // Find user - but don't return early to prevent timing attacks
    let user_result = state.db.get_user_by_email(&request.email).await?;

    // Verify password - always perform verification to prevent timing attacks
    // Use a dummy hash when user doesn't exist to maintain constant-time behavior
    // This dummy hash is a valid Argon2 hash that will always fail verification
    const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

    let (hash_to_verify, user) = match user_result {
        Some(u) => (u.password_hash.clone(), Some(u)),
        None => (DUMMY_HASH.to_string(), None),
    };

    let password_valid = verify_password(&request.password, &hash_to_verify)?;

    // Same 401 whether the email or the password was wrong
    let user = match (user, password_valid) {
        (Some(u), true) => u,
        _ => return Err(ApiError::Unauthorized),
    };

    let token = state
        .jwt
        .generate_token(user.id, &user.name, user.role.as_str())?;

    info!("User {} logged in", user.id);

    Ok(Json(AuthResponse {
        token,
        expires_in: state.jwt.expiry_secs(),
        user: user.into(),
    }))
}

/// GET /api/auth/me
async fn me(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(auth.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(user.into()))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}
