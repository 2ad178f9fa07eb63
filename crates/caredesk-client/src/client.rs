//! Typed Caredesk API client

use caredesk_db::{Appointment, AppointmentStatus, Gender, MedicalRecord, Role};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ClientError;
use crate::session::{Identity, Session};

/// Auth endpoint response
#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    #[allow(dead_code)]
    expires_in: i64,
    user: Identity,
}

/// Error body shape returned by the API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Registration form
#[derive(Debug, Clone, Serialize, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
}

/// New appointment form
#[derive(Debug, Clone, Serialize, Default)]
pub struct AppointmentRequest {
    /// Only meaningful for admin callers booking on a patient's behalf
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<i64>,
    pub date: NaiveDate,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Partial appointment update; absent fields are left untouched
#[derive(Debug, Clone, Serialize, Default)]
pub struct AppointmentChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// New medical record form (doctor only)
#[derive(Debug, Clone, Serialize)]
pub struct RecordRequest {
    pub patient: i64,
    pub diagnosis: String,
    pub prescription: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_date: Option<DateTime<Utc>>,
}

/// Caredesk API client
///
/// Holds the session the dashboards share. Authenticated calls fail locally
/// with `NotAuthenticated` when no session is established.
pub struct ApiClient {
    base_url: String,
    client: Client,
    session: Option<Session>,
}

impl ApiClient {
    /// Create a new client against the given API base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        let client = Client::builder().build()?;

        info!("Created Caredesk client for {}", base_url);

        Ok(Self {
            base_url,
            client,
            session: None,
        })
    }

    // ==================== Session Lifecycle ====================

    /// Establish the session explicitly, e.g. from persisted credentials
    pub fn establish_session(&mut self, token: String, identity: Identity) {
        debug!("Session established for user {}", identity.id);
        self.session = Some(Session::new(token, identity));
    }

    /// Drop the session; subsequent authenticated calls fail locally
    pub fn clear_session(&mut self) {
        debug!("Session cleared");
        self.session = None;
    }

    /// The current session, if any
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn require_session(&self) -> Result<&Session, ClientError> {
        self.session.as_ref().ok_or(ClientError::NotAuthenticated)
    }

    // ==================== Auth ====================

    /// Register a new account and establish the session from the response
    pub async fn register(&mut self, form: &RegisterForm) -> Result<&Session, ClientError> {
        let response = self
            .client
            .post(format!("{}/api/auth/register", self.base_url))
            .json(form)
            .send()
            .await?;
        let auth: AuthResponse = handle(response).await?;

        self.establish_session(auth.token, auth.user);
        self.require_session()
    }

    /// Log in and establish the session from the response
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&Session, ClientError> {
        let response = self
            .client
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let auth: AuthResponse = handle(response).await?;

        self.establish_session(auth.token, auth.user);
        self.require_session()
    }

    /// Fetch the fresh profile and merge it into the session, keeping the
    /// token (cached-plus-refresh)
    pub async fn refresh_identity(&mut self) -> Result<&Identity, ClientError> {
        let session = self.require_session()?;
        let response = self
            .client
            .get(format!("{}/api/auth/me", self.base_url))
            .bearer_auth(session.token())
            .send()
            .await?;
        let fresh: Identity = handle(response).await?;

        match self.session.as_mut() {
            Some(session) => {
                session.merge_identity(fresh);
                Ok(session.identity())
            }
            None => Err(ClientError::NotAuthenticated),
        }
    }

    // ==================== Users ====================

    /// List users, optionally filtered by role
    pub async fn users(&self, role: Option<Role>) -> Result<Vec<Identity>, ClientError> {
        let session = self.require_session()?;
        let mut request = self
            .client
            .get(format!("{}/api/users", self.base_url))
            .bearer_auth(session.token());
        if let Some(role) = role {
            request = request.query(&[("role", role.as_str())]);
        }
        handle(request.send().await?).await
    }

    /// Get a user by id
    pub async fn user(&self, id: i64) -> Result<Identity, ClientError> {
        let session = self.require_session()?;
        let response = self
            .client
            .get(format!("{}/api/users/{}", self.base_url, id))
            .bearer_auth(session.token())
            .send()
            .await?;
        handle(response).await
    }

    /// Create a user (admin)
    pub async fn create_user(&self, form: &RegisterForm) -> Result<Identity, ClientError> {
        let session = self.require_session()?;
        let response = self
            .client
            .post(format!("{}/api/users", self.base_url))
            .bearer_auth(session.token())
            .json(form)
            .send()
            .await?;
        handle(response).await
    }

    /// Partially update a user (admin)
    pub async fn update_user(
        &self,
        id: i64,
        changes: &serde_json::Value,
    ) -> Result<Identity, ClientError> {
        let session = self.require_session()?;
        let response = self
            .client
            .put(format!("{}/api/users/{}", self.base_url, id))
            .bearer_auth(session.token())
            .json(changes)
            .send()
            .await?;
        handle(response).await
    }

    /// Delete a user (admin)
    pub async fn delete_user(&self, id: i64) -> Result<(), ClientError> {
        let session = self.require_session()?;
        let response = self
            .client
            .delete(format!("{}/api/users/{}", self.base_url, id))
            .bearer_auth(session.token())
            .send()
            .await?;
        expect_no_content(response).await
    }

    // ==================== Appointments ====================

    /// List appointments within the caller's scope
    pub async fn appointments(&self) -> Result<Vec<Appointment>, ClientError> {
        let session = self.require_session()?;
        let response = self
            .client
            .get(format!("{}/api/appointments", self.base_url))
            .bearer_auth(session.token())
            .send()
            .await?;
        handle(response).await
    }

    /// Book an appointment
    pub async fn create_appointment(
        &self,
        form: &AppointmentRequest,
    ) -> Result<Appointment, ClientError> {
        let session = self.require_session()?;
        let response = self
            .client
            .post(format!("{}/api/appointments", self.base_url))
            .bearer_auth(session.token())
            .json(form)
            .send()
            .await?;
        handle(response).await
    }

    /// Update an appointment (admin/doctor)
    pub async fn update_appointment(
        &self,
        id: i64,
        changes: &AppointmentChange,
    ) -> Result<Appointment, ClientError> {
        let session = self.require_session()?;
        let response = self
            .client
            .put(format!("{}/api/appointments/{}", self.base_url, id))
            .bearer_auth(session.token())
            .json(changes)
            .send()
            .await?;
        handle(response).await
    }

    /// Delete an appointment (admin)
    pub async fn delete_appointment(&self, id: i64) -> Result<(), ClientError> {
        let session = self.require_session()?;
        let response = self
            .client
            .delete(format!("{}/api/appointments/{}", self.base_url, id))
            .bearer_auth(session.token())
            .send()
            .await?;
        expect_no_content(response).await
    }

    // ==================== Medical Records ====================

    /// List medical records within the caller's scope
    pub async fn medical_records(&self) -> Result<Vec<MedicalRecord>, ClientError> {
        let session = self.require_session()?;
        let response = self
            .client
            .get(format!("{}/api/medical-records", self.base_url))
            .bearer_auth(session.token())
            .send()
            .await?;
        handle(response).await
    }

    /// Get a medical record by id
    pub async fn medical_record(&self, id: i64) -> Result<MedicalRecord, ClientError> {
        let session = self.require_session()?;
        let response = self
            .client
            .get(format!("{}/api/medical-records/{}", self.base_url, id))
            .bearer_auth(session.token())
            .send()
            .await?;
        handle(response).await
    }

    /// Author a medical record (doctor)
    pub async fn create_medical_record(
        &self,
        form: &RecordRequest,
    ) -> Result<MedicalRecord, ClientError> {
        let session = self.require_session()?;
        let response = self
            .client
            .post(format!("{}/api/medical-records", self.base_url))
            .bearer_auth(session.token())
            .json(form)
            .send()
            .await?;
        handle(response).await
    }
}

/// Decode a JSON response, converting API failures to `ClientError::Api`
async fn handle<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    } else {
        let message = response
            .json::<ApiErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| status.to_string());
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Accept an empty success response
async fn expect_no_content(response: Response) -> Result<(), ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let message = response
            .json::<ApiErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| status.to_string());
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: 1,
            name: "Pat".to_string(),
            email: "p@x.com".to_string(),
            role: Role::Patient,
            contact: None,
            age: None,
            specialization: None,
        }
    }

    #[test]
    fn test_session_lifecycle() {
        let mut client = ApiClient::new("http://localhost:5000").unwrap();
        assert!(client.session().is_none());

        client.establish_session("tok".to_string(), identity());
        assert_eq!(client.session().unwrap().token(), "tok");
        assert_eq!(client.session().unwrap().role(), Role::Patient);

        client.clear_session();
        assert!(client.session().is_none());
    }

    #[tokio::test]
    async fn test_calls_require_session() {
        let client = ApiClient::new("http://localhost:5000").unwrap();
        assert!(matches!(
            client.appointments().await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_undecodable_success_body_is_invalid_response() {
        let response = Response::from(
            http::Response::builder()
                .status(200)
                .body("not json")
                .unwrap(),
        );
        let result: Result<Identity, ClientError> = handle(response).await;
        assert!(matches!(result, Err(ClientError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_error_body_maps_to_api_error() {
        let response = Response::from(
            http::Response::builder()
                .status(404)
                .body(r#"{"code":"NOT_FOUND","message":"User: 9"}"#)
                .unwrap(),
        );
        let result: Result<Identity, ClientError> = handle(response).await;
        match result {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "User: 9");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
