//! User operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewUser, Role, UpdateUser, User};
use crate::repository::{Database, map_unique_violation};

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user
    ///
    /// The email is normalized to lowercase before the write; a duplicate
    /// (case-insensitive) fails with `DbError::Duplicate`.
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();
        let email = user.email.to_lowercase();

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role, contact, age, gender,
                               specialization, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.contact)
        .bind(user.age)
        .bind(user.gender.map(|g| g.as_str()))
        .bind(&user.specialization)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &format!("User '{}' already exists", email)))?;

        let id: i64 = result.get("id");

        Ok(User {
            id,
            name: user.name,
            email,
            password_hash: user.password_hash,
            role: user.role,
            contact: user.contact,
            age: user.age,
            gender: user.gender,
            specialization: user.specialization,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a user by email (case-insensitive)
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, role, contact, age, gender,
                   specialization, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| User::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, role, contact, age, gender,
                   specialization, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| User::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List users, optionally restricted to one role
    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, DbError> {
        let rows = match role {
            Some(role) => {
                sqlx::query(
                    r#"
                    SELECT id, name, email, password_hash, role, contact, age, gender,
                           specialization, created_at, updated_at
                    FROM users
                    WHERE role = ?
                    ORDER BY name
                    "#,
                )
                .bind(role.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, name, email, password_hash, role, contact, age, gender,
                           specialization, created_at, updated_at
                    FROM users
                    ORDER BY name
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Apply a partial update to a user
    ///
    /// Absent fields are left untouched. The password hash is not reachable
    /// from here; see `update_user_password`.
    pub async fn update_user(&self, id: i64, update: UpdateUser) -> Result<Option<User>, DbError> {
        let Some(existing) = self.get_user_by_id(id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let name = update.name.unwrap_or(existing.name);
        let email = update
            .email
            .map(|e| e.to_lowercase())
            .unwrap_or(existing.email);
        let role = update.role.unwrap_or(existing.role);
        let contact = update.contact.or(existing.contact);
        let age = update.age.or(existing.age);
        let gender = update.gender.or(existing.gender);
        let specialization = update.specialization.or(existing.specialization);

        sqlx::query(
            r#"
            UPDATE users
            SET name = ?, email = ?, role = ?, contact = ?, age = ?, gender = ?,
                specialization = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(&email)
        .bind(role.as_str())
        .bind(&contact)
        .bind(age)
        .bind(gender.map(|g| g.as_str()))
        .bind(&specialization)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &format!("User '{}' already exists", email)))?;

        self.get_user_by_id(id).await
    }

    /// Update user password hash
    ///
    /// The only write path for the secret field. Callers hash exactly once,
    /// and only when the request actually carried a new password.
    pub async fn update_user_password(
        &self,
        id: i64,
        password_hash: &str,
    ) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user
    ///
    /// Immediate and unrecoverable; appointments and records keep their weak
    /// references to the vanished id.
    pub async fn delete_user(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}
