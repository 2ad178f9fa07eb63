//! Medical record operations
//!
//! Records are an append-only audit trail: insert, list, and get only.

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{AccessScope, MedicalRecord, NewMedicalRecord};
use crate::repository::Database;

impl Database {
    // ==================== Medical Record Operations ====================

    /// Insert a new medical record
    pub async fn insert_medical_record(
        &self,
        record: NewMedicalRecord,
    ) -> Result<MedicalRecord, DbError> {
        let now = Utc::now();
        let visit_date = record.visit_date.unwrap_or(now);

        let result = sqlx::query(
            r#"
            INSERT INTO medical_records (patient_id, doctor_id, doctor_name, diagnosis,
                                         prescription, notes, visit_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(record.patient_id)
        .bind(record.doctor_id)
        .bind(&record.doctor_name)
        .bind(&record.diagnosis)
        .bind(&record.prescription)
        .bind(&record.notes)
        .bind(visit_date.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(MedicalRecord {
            id,
            patient_id: record.patient_id,
            doctor_id: record.doctor_id,
            doctor_name: record.doctor_name,
            diagnosis: record.diagnosis,
            prescription: record.prescription,
            notes: record.notes,
            visit_date,
            created_at: now,
            updated_at: now,
        })
    }

    /// List medical records visible within the given scope, newest visit first
    pub async fn list_medical_records(
        &self,
        scope: AccessScope,
    ) -> Result<Vec<MedicalRecord>, DbError> {
        const SELECT: &str = r#"
            SELECT id, patient_id, doctor_id, doctor_name, diagnosis, prescription,
                   notes, visit_date, created_at, updated_at
            FROM medical_records
        "#;

        let rows = match scope {
            AccessScope::All => {
                sqlx::query(&format!("{SELECT} ORDER BY visit_date DESC"))
                    .fetch_all(&self.pool)
                    .await?
            }
            AccessScope::Patient(id) => {
                sqlx::query(&format!(
                    "{SELECT} WHERE patient_id = ? ORDER BY visit_date DESC"
                ))
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            AccessScope::Doctor(id) => {
                sqlx::query(&format!(
                    "{SELECT} WHERE doctor_id = ? ORDER BY visit_date DESC"
                ))
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter()
            .map(|row| MedicalRecord::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get a medical record by ID, constrained to the given scope
    ///
    /// A record outside the scope answers as if it did not exist.
    pub async fn get_medical_record_by_id(
        &self,
        id: i64,
        scope: AccessScope,
    ) -> Result<Option<MedicalRecord>, DbError> {
        const SELECT: &str = r#"
            SELECT id, patient_id, doctor_id, doctor_name, diagnosis, prescription,
                   notes, visit_date, created_at, updated_at
            FROM medical_records
        "#;

        let result = match scope {
            AccessScope::All => {
                sqlx::query(&format!("{SELECT} WHERE id = ?"))
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            AccessScope::Patient(user_id) => {
                sqlx::query(&format!("{SELECT} WHERE id = ? AND patient_id = ?"))
                    .bind(id)
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            AccessScope::Doctor(user_id) => {
                sqlx::query(&format!("{SELECT} WHERE id = ? AND doctor_id = ?"))
                    .bind(id)
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        result
            .map(|row| MedicalRecord::try_from(&row).map_err(DbError::from))
            .transpose()
    }
}
