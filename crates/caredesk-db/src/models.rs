//! Database models

use crate::utils::{parse_date_or_today, parse_datetime_or_now};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidRole(String),
    InvalidGender(String),
    InvalidAppointmentStatus(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidRole(s) => write!(f, "Invalid role: {}", s),
            ParseError::InvalidGender(s) => write!(f, "Invalid gender: {}", s),
            ParseError::InvalidAppointmentStatus(s) => {
                write!(f, "Invalid appointment status: {}", s)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Account role
///
/// Closed set; anything else on a stored row or an inbound token is rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            _ => Err(ParseError::InvalidRole(s.to_string())),
        }
    }
}

/// Gender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl FromStr for Gender {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            "Other" => Ok(Gender::Other),
            _ => Err(ParseError::InvalidGender(s.to_string())),
        }
    }
}

/// Appointment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Approved,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Approved => "Approved",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(AppointmentStatus::Pending),
            "Approved" => Ok(AppointmentStatus::Approved),
            "Completed" => Ok(AppointmentStatus::Completed),
            "Cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(ParseError::InvalidAppointmentStatus(s.to_string())),
        }
    }
}

/// Implicit query scope derived from the caller's role
///
/// Applied before any caller-supplied filter; request parameters can narrow
/// the result set but never widen it past this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    /// Admin: unfiltered
    All,
    /// Patient: rows whose patient reference is this user
    Patient(i64),
    /// Doctor: rows whose doctor reference is this user
    Doctor(i64),
}

impl AccessScope {
    pub fn for_role(role: Role, user_id: i64) -> Self {
        match role {
            Role::Admin => AccessScope::All,
            Role::Patient => AccessScope::Patient(user_id),
            Role::Doctor => AccessScope::Doctor(user_id),
        }
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Stored lowercased; unique
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub contact: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    /// Only meaningful for doctors
    pub specialization: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub contact: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub specialization: Option<String>,
}

/// Update user (for partial updates)
///
/// The password hash travels its own path (`update_user_password`) and is
/// deliberately absent here.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub contact: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub specialization: Option<String>,
}

/// Appointment model
///
/// `patient_name` and `doctor_name` are snapshots taken at write time and
/// intentionally not kept in sync with the referenced users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New appointment (for insertion)
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: i64,
    pub patient_name: String,
    pub doctor_id: Option<i64>,
    pub doctor_name: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub reason: Option<String>,
}

/// Update appointment (for partial updates)
///
/// The patient reference is immutable after creation and has no field here.
#[derive(Debug, Clone, Default)]
pub struct UpdateAppointment {
    pub doctor_id: Option<i64>,
    pub doctor_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub reason: Option<String>,
}

/// Medical record model
///
/// Append-only: the repository exposes no update or delete for these rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    /// Snapshot of the authoring doctor's name at write time
    pub doctor_name: String,
    pub diagnosis: String,
    pub prescription: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub visit_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New medical record (for insertion)
#[derive(Debug, Clone)]
pub struct NewMedicalRecord {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub diagnosis: String,
    pub prescription: String,
    pub notes: Option<String>,
    /// Defaults to insertion time when not supplied
    pub visit_date: Option<DateTime<Utc>>,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let role_str: String = row.try_get("role")?;
        let role = Role::from_str(&role_str).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let gender = row
            .try_get::<Option<String>, _>("gender")?
            .map(|s| Gender::from_str(&s))
            .transpose()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role,
            contact: row.try_get("contact")?,
            age: row.try_get("age")?,
            gender,
            specialization: row.try_get("specialization")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Appointment {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let status_str: String = row.try_get("status")?;
        Ok(Appointment {
            id: row.try_get("id")?,
            patient_id: row.try_get("patient_id")?,
            patient_name: row.try_get("patient_name")?,
            doctor_id: row.try_get("doctor_id")?,
            doctor_name: row.try_get("doctor_name")?,
            date: parse_date_or_today(&row.try_get::<String, _>("date")?),
            time: row.try_get("time")?,
            status: AppointmentStatus::from_str(&status_str)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            reason: row.try_get("reason")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for MedicalRecord {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(MedicalRecord {
            id: row.try_get("id")?,
            patient_id: row.try_get("patient_id")?,
            doctor_id: row.try_get("doctor_id")?,
            doctor_name: row.try_get("doctor_name")?,
            diagnosis: row.try_get("diagnosis")?,
            prescription: row.try_get("prescription")?,
            notes: row.try_get("notes")?,
            visit_date: parse_datetime_or_now(&row.try_get::<String, _>("visit_date")?),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Doctor, Role::Patient] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn test_access_scope_for_role() {
        assert_eq!(AccessScope::for_role(Role::Admin, 7), AccessScope::All);
        assert_eq!(
            AccessScope::for_role(Role::Patient, 7),
            AccessScope::Patient(7)
        );
        assert_eq!(
            AccessScope::for_role(Role::Doctor, 7),
            AccessScope::Doctor(7)
        );
    }

    #[test]
    fn test_status_default_is_pending() {
        assert_eq!(AppointmentStatus::default(), AppointmentStatus::Pending);
        assert!(AppointmentStatus::from_str("Done").is_err());
    }
}
