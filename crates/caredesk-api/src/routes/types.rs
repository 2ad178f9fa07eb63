//! Request/Response DTOs
//!
//! Unknown request fields are ignored; the password hash never appears in any
//! response shape.

use caredesk_db::{AppointmentStatus, Gender, User};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Self-service registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to patient
    pub role: Option<String>,
    pub contact: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub specialization: Option<String>,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login/registration response
#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

// ==================== User Types ====================

/// Create user request (admin)
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub contact: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub specialization: Option<String>,
}

/// Partial user update request (admin)
///
/// `password` is the only way a secret enters an update; when present it is
/// hashed and stored through the dedicated path, otherwise the stored hash is
/// untouched.
#[derive(Deserialize, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub contact: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub specialization: Option<String>,
}

/// Role filter for user listing
#[derive(Deserialize, Default)]
pub struct ListUsersQuery {
    pub role: Option<String>,
}

/// User response (without the password hash)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        UserResponse {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role.as_str().to_string(),
            contact: u.contact,
            age: u.age,
            gender: u.gender,
            specialization: u.specialization,
            created_at: u.created_at.to_rfc3339(),
            updated_at: u.updated_at.to_rfc3339(),
        }
    }
}

// ==================== Appointment Types ====================

/// Create appointment request
#[derive(Deserialize)]
pub struct CreateAppointmentRequest {
    /// Required when an admin books on a patient's behalf; ignored for
    /// patient callers, who always book for themselves.
    pub patient: Option<i64>,
    pub doctor: Option<i64>,
    pub date: NaiveDate,
    pub time: String,
    pub reason: Option<String>,
}

/// Partial appointment update request
///
/// The patient reference is immutable and deliberately absent.
#[derive(Deserialize, Default)]
pub struct UpdateAppointmentRequest {
    pub doctor: Option<i64>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub reason: Option<String>,
}

// ==================== Medical Record Types ====================

/// Create medical record request (doctor)
#[derive(Deserialize)]
pub struct CreateMedicalRecordRequest {
    pub patient: i64,
    pub diagnosis: String,
    pub prescription: String,
    pub notes: Option<String>,
    pub visit_date: Option<chrono::DateTime<chrono::Utc>>,
}
