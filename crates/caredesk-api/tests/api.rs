//! End-to-end API tests against an in-memory SQLite database

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use caredesk_api::{AppState, create_router};
use caredesk_auth::JwtManager;
use caredesk_db::Database;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

async fn test_app() -> Router {
    let db = Database::new("sqlite::memory:").await.unwrap();
    let jwt = Arc::new(JwtManager::new("test-secret-key", 24));
    create_router(AppState::new(db, jwt))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Register a user and return (token, user id)
async fn register(app: &Router, name: &str, email: &str, role: &str) -> (String, i64) {
    let (status, body) = send(
        app,
        post_json(
            "/api/auth/register",
            None,
            json!({
                "name": name,
                "email": email,
                "password": "secret123",
                "role": role,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_i64().unwrap(),
    )
}

#[tokio::test]
async fn duplicate_email_is_conflict_case_insensitive() {
    let app = test_app().await;

    register(&app, "Alice", "a@x.com", "patient").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/register",
            None,
            json!({
                "name": "Alice Again",
                "email": "A@x.com",
                "password": "secret123",
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn login_rejects_bad_credentials_uniformly() {
    let app = test_app().await;
    register(&app, "Alice", "alice@x.com", "patient").await;

    let (status, _) = send(
        &app,
        post_json(
            "/api/auth/login",
            None,
            json!({"email": "alice@x.com", "password": "wrong-pass"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        post_json(
            "/api/auth/login",
            None,
            json!({"email": "nobody@x.com", "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Email lookup is case-insensitive
    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/login",
            None,
            json!({"email": "ALICE@x.com", "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn responses_never_carry_the_password() {
    let app = test_app().await;
    let (token, _) = register(&app, "Alice", "alice@x.com", "patient").await;

    let (status, body) = send(&app, get_with_token("/api/auth/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
    assert_eq!(body["email"], "alice@x.com");
}

#[tokio::test]
async fn appointment_listing_is_scoped_by_role() {
    let app = test_app().await;
    let (admin, _) = register(&app, "Root", "root@x.com", "admin").await;
    let (p1, p1_id) = register(&app, "Pat One", "p1@x.com", "patient").await;
    let (p2, _) = register(&app, "Pat Two", "p2@x.com", "patient").await;
    let (d1, d1_id) = register(&app, "Doc One", "d1@x.com", "doctor").await;
    let (d2, _) = register(&app, "Doc Two", "d2@x.com", "doctor").await;

    // p1 books with d1, p2 books without a doctor
    let (status, _) = send(
        &app,
        post_json(
            "/api/appointments",
            Some(&p1),
            json!({"doctor": d1_id, "date": "2026-09-01", "time": "10:30", "reason": "checkup"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        post_json(
            "/api/appointments",
            Some(&p2),
            json!({"date": "2026-09-02", "time": "11:00"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Patient sees only their own, even with a widening query parameter
    let (status, body) = send(
        &app,
        get_with_token("/api/appointments?patient=all", &p1),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["patient_id"], p1_id);

    // Doctor sees only their own schedule
    let (_, body) = send(&app, get_with_token("/api/appointments", &d1)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (_, body) = send(&app, get_with_token("/api/appointments", &d2)).await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    // Admin listing is unfiltered
    let (_, body) = send(&app, get_with_token("/api/appointments", &admin)).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn appointment_snapshots_patient_and_doctor_names() {
    let app = test_app().await;
    let (p1, _) = register(&app, "Pat One", "p1@x.com", "patient").await;
    let (_, d1_id) = register(&app, "Doc One", "d1@x.com", "doctor").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/appointments",
            Some(&p1),
            json!({"doctor": d1_id, "date": "2026-09-01", "time": "10:30"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["patient_name"], "Pat One");
    assert_eq!(body["doctor_name"], "Doc One");
    assert_eq!(body["status"], "Pending");
}

#[tokio::test]
async fn only_admin_deletes_appointments() {
    let app = test_app().await;
    let (admin, _) = register(&app, "Root", "root@x.com", "admin").await;
    let (p1, _) = register(&app, "Pat One", "p1@x.com", "patient").await;

    let (_, body) = send(
        &app,
        post_json(
            "/api/appointments",
            Some(&p1),
            json!({"date": "2026-09-01", "time": "10:30"}),
        ),
    )
    .await;
    let id = body["id"].as_i64().unwrap();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/appointments/{}", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", p1))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/appointments/{}", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn medical_records_are_doctor_authored_and_patient_visible() {
    let app = test_app().await;
    let (p1, p1_id) = register(&app, "Pat One", "p1@x.com", "patient").await;
    let (p2, _) = register(&app, "Pat Two", "p2@x.com", "patient").await;
    let (d1, _) = register(&app, "Doc One", "d1@x.com", "doctor").await;

    // A patient cannot author a record
    let (status, _) = send(
        &app,
        post_json(
            "/api/medical-records",
            Some(&p1),
            json!({"patient": p1_id, "diagnosis": "flu", "prescription": "rest"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The doctor can
    let (status, body) = send(
        &app,
        post_json(
            "/api/medical-records",
            Some(&d1),
            json!({"patient": p1_id, "diagnosis": "flu", "prescription": "rest", "notes": "mild"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["doctor_name"], "Doc One");
    let record_id = body["id"].as_i64().unwrap();

    // The referenced patient sees it in their own list
    let (_, body) = send(&app, get_with_token("/api/medical-records", &p1)).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], record_id);

    // Another patient cannot even observe its existence
    let (status, _) = send(
        &app,
        get_with_token(&format!("/api/medical-records/{}", record_id), &p2),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, get_with_token("/api/medical-records", &p2)).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn deleted_identity_token_is_unauthorized() {
    let app = test_app().await;
    let (admin, _) = register(&app, "Root", "root@x.com", "admin").await;
    let (p1, p1_id) = register(&app, "Pat One", "p1@x.com", "patient").await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/users/{}", p1_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The still-valid token no longer resolves to anyone
    let (status, _) = send(&app, get_with_token("/api/auth/me", &p1)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tampered_and_missing_tokens_are_unauthorized() {
    let app = test_app().await;
    let (token, _) = register(&app, "Pat One", "p1@x.com", "patient").await;

    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let (status, _) = send(&app, get_with_token("/api/auth/me", &tampered)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("GET")
        .uri("/api/auth/me")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_update_keeps_password_unless_supplied() {
    let app = test_app().await;
    let (admin, _) = register(&app, "Root", "root@x.com", "admin").await;
    let (_, p1_id) = register(&app, "Pat One", "p1@x.com", "patient").await;

    // Rename without touching the password
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/users/{}", p1_id))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .body(Body::from(json!({"name": "Pat Renamed"}).to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Pat Renamed");

    // Old password still works
    let (status, _) = send(
        &app,
        post_json(
            "/api/auth/login",
            None,
            json!({"email": "p1@x.com", "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Supplying a password rotates it
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/users/{}", p1_id))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .body(Body::from(json!({"password": "rotated456"}).to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        post_json(
            "/api/auth/login",
            None,
            json!({"email": "p1@x.com", "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        post_json(
            "/api/auth/login",
            None,
            json!({"email": "p1@x.com", "password": "rotated456"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn register_validates_required_fields() {
    let app = test_app().await;

    // Short password
    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/register",
            None,
            json!({"name": "A", "email": "a@x.com", "password": "short"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");

    // Unknown role
    let (status, _) = send(
        &app,
        post_json(
            "/api/auth/register",
            None,
            json!({"name": "A", "email": "a@x.com", "password": "secret123", "role": "superuser"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown fields are ignored, not rejected
    let (status, _) = send(
        &app,
        post_json(
            "/api/auth/register",
            None,
            json!({"name": "A", "email": "a@x.com", "password": "secret123", "favorite_color": "teal"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn malformed_body_is_structured_validation_error() {
    let app = test_app().await;
    let (patient, _) = register(&app, "Pat", "pat@x.com", "patient").await;

    // Missing required `date` field
    let (status, body) = send(
        &app,
        post_json(
            "/api/appointments",
            Some(&patient),
            json!({"time": "10:30", "reason": "Checkup"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
    assert!(body["message"].is_string());

    // Body that is not JSON at all
    let request = Request::builder()
        .method("POST")
        .uri("/api/appointments")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", patient))
        .body(Body::from("not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
}

#[tokio::test]
async fn user_listing_supports_role_filter() {
    let app = test_app().await;
    let (admin, _) = register(&app, "Root", "root@x.com", "admin").await;
    register(&app, "Pat One", "p1@x.com", "patient").await;
    register(&app, "Doc One", "d1@x.com", "doctor").await;

    let (status, body) = send(&app, get_with_token("/api/users?role=doctor", &admin)).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["role"], "doctor");

    let (_, body) = send(&app, get_with_token("/api/users", &admin)).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}
