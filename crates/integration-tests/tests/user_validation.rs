//! Account endpoints reject bad input before touching the database.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use emarket_integration_tests::TestApp;

fn registration() -> serde_json::Value {
    json!({
        "firstName": "Jane",
        "lastName": "Doe",
        "email": "jane@example.com",
        "mobileNo": "09171234567",
        "password": "correct horse battery"
    })
}

#[tokio::test]
async fn test_register_requires_all_fields() {
    let app = TestApp::new();
    let mut body = registration();
    body.as_object_mut().unwrap().remove("mobileNo");

    let response = app
        .send(Method::POST, "/users/register", None, Some(body))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), Some("All fields are required"));
}

#[tokio::test]
async fn test_register_blank_field() {
    let app = TestApp::new();
    let mut body = registration();
    body["firstName"] = json!("   ");

    let response = app
        .send(Method::POST, "/users/register", None, Some(body))
        .await;
    assert_eq!(response.message(), Some("All fields are required"));
}

#[tokio::test]
async fn test_register_invalid_email() {
    let app = TestApp::new();
    let mut body = registration();
    body["email"] = json!("jane.example.com");

    let response = app
        .send(Method::POST, "/users/register", None, Some(body))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), Some("Invalid email format"));
}

#[tokio::test]
async fn test_register_short_password() {
    let app = TestApp::new();
    let mut body = registration();
    body["password"] = json!("short");

    let response = app
        .send(Method::POST, "/users/register", None, Some(body))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.message(),
        Some("Password must be at least 8 characters")
    );
}

#[tokio::test]
async fn test_login_malformed_email() {
    let app = TestApp::new();

    let response = app
        .send(
            Method::POST,
            "/users/login",
            None,
            Some(json!({"email": "no-at-sign", "password": "whatever1"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), Some("Invalid email format"));
}

#[tokio::test]
async fn test_password_reset_request_requires_email() {
    let app = TestApp::new();

    let response = app
        .send(
            Method::POST,
            "/users/request-password-reset",
            None,
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), Some("Email is required"));
}

#[tokio::test]
async fn test_reset_password_field_checks() {
    let app = TestApp::new();

    let missing = app
        .send(
            Method::POST,
            "/users/reset-password/1/some-token",
            None,
            Some(json!({"password": "new password"})),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.message(), Some("All fields are required"));

    let mismatch = app
        .send(
            Method::POST,
            "/users/reset-password/1/some-token",
            None,
            Some(json!({
                "password": "new password",
                "passwordConfirmation": "other password"
            })),
        )
        .await;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);
    assert_eq!(mismatch.message(), Some("Passwords do not match"));
}

#[tokio::test]
async fn test_reset_password_non_numeric_id() {
    let app = TestApp::new();

    let response = app
        .send(
            Method::POST,
            "/users/reset-password/abc/some-token",
            None,
            Some(json!({
                "password": "new password",
                "passwordConfirmation": "new password"
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), Some("Invalid path parameter"));
}

#[tokio::test]
async fn test_confirm_email_malformed_token() {
    let app = TestApp::new();

    let response = app
        .send(Method::GET, "/users/confirm-email/not-a-token", None, None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), Some("Invalid confirmation token."));
}

#[tokio::test]
async fn test_update_password_too_short() {
    let app = TestApp::new();
    let token = app.access_token(1, false);

    let response = app
        .send(
            Method::PATCH,
            "/users/update-password",
            Some(&token),
            Some(json!({"newPassword": "tiny"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
