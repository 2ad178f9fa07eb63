//! Appointment routes
//!
//! Listing applies the caller's implicit scope before anything else; a
//! patient only ever sees their own bookings, a doctor their own schedule.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use caredesk_auth::authorize;
use caredesk_db::{AccessScope, Appointment, NewAppointment, Role, UpdateAppointment};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

use super::auth::{RequireAdmin, RequireAuth};
use super::types::{CreateAppointmentRequest, UpdateAppointmentRequest};

/// GET /api/appointments
async fn list_appointments(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let scope = AccessScope::for_role(user.role, user.id);
    let appointments = state.db.list_appointments(scope).await?;

    Ok(Json(appointments))
}

/// GET /api/appointments/{id}
async fn get_appointment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment = state
        .db
        .get_appointment_by_id(id)
        .await?
        .filter(|a| match AccessScope::for_role(user.role, user.id) {
            AccessScope::All => true,
            AccessScope::Patient(uid) => a.patient_id == uid,
            AccessScope::Doctor(uid) => a.doctor_id == Some(uid),
        })
        .ok_or_else(|| ApiError::NotFound(format!("Appointment: {}", id)))?;

    Ok(Json(appointment))
}

/// POST /api/appointments (Patient books for self; admin books for a patient)
async fn create_appointment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    authorize(&user, &[Role::Patient, Role::Admin])?;

    if request.time.trim().is_empty() {
        return Err(ApiError::Validation(
            "Please provide appointment time".to_string(),
        ));
    }

    // Resolve the patient reference and snapshot their display name
    let (patient_id, patient_name) = if user.role == Role::Admin {
        let patient_id = request.patient.ok_or_else(|| {
            ApiError::Validation("Please provide a patient for the appointment".to_string())
        })?;
        let patient = state
            .db
            .get_user_by_id(patient_id)
            .await?
            .filter(|u| u.role == Role::Patient)
            .ok_or_else(|| ApiError::NotFound(format!("Patient: {}", patient_id)))?;
        (patient.id, patient.name)
    } else {
        (user.id, user.name.clone())
    };

    let (doctor_id, doctor_name) = match request.doctor {
        Some(doctor_id) => {
            let doctor = state
                .db
                .get_user_by_id(doctor_id)
                .await?
                .filter(|u| u.role == Role::Doctor)
                .ok_or_else(|| ApiError::NotFound(format!("Doctor: {}", doctor_id)))?;
            (Some(doctor.id), Some(doctor.name))
        }
        None => (None, None),
    };

    debug!("Creating appointment for patient {}", patient_id);

    let appointment = state
        .db
        .insert_appointment(NewAppointment {
            patient_id,
            patient_name,
            doctor_id,
            doctor_name,
            date: request.date,
            time: request.time,
            reason: request.reason,
        })
        .await?;

    info!("Created appointment {}", appointment.id);

    Ok((StatusCode::CREATED, Json(appointment)))
}

/// PUT /api/appointments/{id} (Admin or doctor)
async fn update_appointment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Appointment>, ApiError> {
    authorize(&user, &[Role::Admin, Role::Doctor])?;

    debug!("Updating appointment: {}", id);

    // A new doctor assignment re-snapshots the display name
    let (doctor_id, doctor_name) = match request.doctor {
        Some(doctor_id) => {
            let doctor = state
                .db
                .get_user_by_id(doctor_id)
                .await?
                .filter(|u| u.role == Role::Doctor)
                .ok_or_else(|| ApiError::NotFound(format!("Doctor: {}", doctor_id)))?;
            (Some(doctor.id), Some(doctor.name))
        }
        None => (None, None),
    };

    let appointment = state
        .db
        .update_appointment(
            id,
            UpdateAppointment {
                doctor_id,
                doctor_name,
                date: request.date,
                time: request.time,
                status: request.status,
                reason: request.reason,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Appointment: {}", id)))?;

    info!("Updated appointment {}", appointment.id);

    Ok(Json(appointment))
}

/// DELETE /api/appointments/{id} (Admin only)
async fn delete_appointment(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    debug!("Deleting appointment: {}", id);

    let deleted = state.db.delete_appointment(id).await?;

    if deleted {
        info!("Deleted appointment {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Appointment: {}", id)))
    }
}

/// Create appointment routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/appointments", get(list_appointments))
        .route("/api/appointments", post(create_appointment))
        .route("/api/appointments/{id}", get(get_appointment))
        .route("/api/appointments/{id}", put(update_appointment))
        .route("/api/appointments/{id}", delete(delete_appointment))
}
