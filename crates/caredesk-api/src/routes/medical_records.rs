//! Medical record routes
//!
//! Records are append-only; no update or delete route exists.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use caredesk_db::{AccessScope, MedicalRecord, NewMedicalRecord, Role};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

use super::auth::{RequireAuth, RequireDoctor};
use super::types::CreateMedicalRecordRequest;

/// GET /api/medical-records
async fn list_medical_records(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<MedicalRecord>>, ApiError> {
    let scope = AccessScope::for_role(user.role, user.id);
    let records = state.db.list_medical_records(scope).await?;

    Ok(Json(records))
}

/// GET /api/medical-records/{id}
///
/// The caller's scope constrains the lookup itself, so a foreign record is a
/// plain 404.
async fn get_medical_record(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MedicalRecord>, ApiError> {
    let scope = AccessScope::for_role(user.role, user.id);
    let record = state
        .db
        .get_medical_record_by_id(id, scope)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Medical record: {}", id)))?;

    Ok(Json(record))
}

/// POST /api/medical-records (Doctor only)
async fn create_medical_record(
    RequireDoctor(doctor): RequireDoctor,
    State(state): State<AppState>,
    Json(request): Json<CreateMedicalRecordRequest>,
) -> Result<(StatusCode, Json<MedicalRecord>), ApiError> {
    if request.diagnosis.trim().is_empty() {
        return Err(ApiError::Validation(
            "Please provide a diagnosis".to_string(),
        ));
    }
    if request.prescription.trim().is_empty() {
        return Err(ApiError::Validation(
            "Please provide a prescription".to_string(),
        ));
    }

    let patient = state
        .db
        .get_user_by_id(request.patient)
        .await?
        .filter(|u| u.role == Role::Patient)
        .ok_or_else(|| ApiError::NotFound(format!("Patient: {}", request.patient)))?;

    debug!(
        "Doctor {} creating record for patient {}",
        doctor.id, patient.id
    );

    let record = state
        .db
        .insert_medical_record(NewMedicalRecord {
            patient_id: patient.id,
            doctor_id: doctor.id,
            doctor_name: doctor.name,
            diagnosis: request.diagnosis,
            prescription: request.prescription,
            notes: request.notes,
            visit_date: request.visit_date,
        })
        .await?;

    info!("Created medical record {}", record.id);

    Ok((StatusCode::CREATED, Json(record)))
}

/// Create medical record routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/medical-records", get(list_medical_records))
        .route("/api/medical-records", post(create_medical_record))
        .route("/api/medical-records/{id}", get(get_medical_record))
}
