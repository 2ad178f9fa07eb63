//! Appointment operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{AccessScope, Appointment, AppointmentStatus, NewAppointment, UpdateAppointment};
use crate::repository::Database;

impl Database {
    // ==================== Appointment Operations ====================

    /// Insert a new appointment
    ///
    /// Status always starts out Pending; the display-name snapshots are the
    /// caller's responsibility to resolve before the write.
    pub async fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, DbError> {
        let now = Utc::now();
        let status = AppointmentStatus::default();

        let result = sqlx::query(
            r#"
            INSERT INTO appointments (patient_id, patient_name, doctor_id, doctor_name,
                                      date, time, status, reason, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(appointment.patient_id)
        .bind(&appointment.patient_name)
        .bind(appointment.doctor_id)
        .bind(&appointment.doctor_name)
        .bind(appointment.date.format("%Y-%m-%d").to_string())
        .bind(&appointment.time)
        .bind(status.as_str())
        .bind(&appointment.reason)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Appointment {
            id,
            patient_id: appointment.patient_id,
            patient_name: appointment.patient_name,
            doctor_id: appointment.doctor_id,
            doctor_name: appointment.doctor_name,
            date: appointment.date,
            time: appointment.time,
            status,
            reason: appointment.reason,
            created_at: now,
            updated_at: now,
        })
    }

    /// List appointments visible within the given scope, newest first
    pub async fn list_appointments(
        &self,
        scope: AccessScope,
    ) -> Result<Vec<Appointment>, DbError> {
        const SELECT: &str = r#"
            SELECT id, patient_id, patient_name, doctor_id, doctor_name, date, time,
                   status, reason, created_at, updated_at
            FROM appointments
        "#;

        let rows = match scope {
            AccessScope::All => {
                sqlx::query(&format!("{SELECT} ORDER BY created_at DESC"))
                    .fetch_all(&self.pool)
                    .await?
            }
            AccessScope::Patient(id) => {
                sqlx::query(&format!(
                    "{SELECT} WHERE patient_id = ? ORDER BY created_at DESC"
                ))
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            AccessScope::Doctor(id) => {
                sqlx::query(&format!(
                    "{SELECT} WHERE doctor_id = ? ORDER BY created_at DESC"
                ))
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter()
            .map(|row| Appointment::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get an appointment by ID
    pub async fn get_appointment_by_id(&self, id: i64) -> Result<Option<Appointment>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, patient_id, patient_name, doctor_id, doctor_name, date, time,
                   status, reason, created_at, updated_at
            FROM appointments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| Appointment::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Apply a partial update to an appointment
    ///
    /// The patient reference is immutable and not part of the update contract.
    pub async fn update_appointment(
        &self,
        id: i64,
        update: UpdateAppointment,
    ) -> Result<Option<Appointment>, DbError> {
        let Some(existing) = self.get_appointment_by_id(id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let doctor_id = update.doctor_id.or(existing.doctor_id);
        let doctor_name = update.doctor_name.or(existing.doctor_name);
        let date = update.date.unwrap_or(existing.date);
        let time = update.time.unwrap_or(existing.time);
        let status = update.status.unwrap_or(existing.status);
        let reason = update.reason.or(existing.reason);

        sqlx::query(
            r#"
            UPDATE appointments
            SET doctor_id = ?, doctor_name = ?, date = ?, time = ?, status = ?,
                reason = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(doctor_id)
        .bind(&doctor_name)
        .bind(date.format("%Y-%m-%d").to_string())
        .bind(&time)
        .bind(status.as_str())
        .bind(&reason)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_appointment_by_id(id).await
    }

    /// Delete an appointment
    pub async fn delete_appointment(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
