//! Bearer token and admin checks on protected routes.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use emarket_integration_tests::TestApp;

#[tokio::test]
async fn test_missing_authorization_header() {
    let app = TestApp::new();

    for (method, uri) in [
        (Method::GET, "/users/details"),
        (Method::GET, "/carts/get-cart"),
        (Method::PUT, "/carts/clear-cart"),
        (Method::POST, "/orders/checkout"),
        (Method::GET, "/orders/my-orders"),
        (Method::GET, "/orders/all-orders"),
    ] {
        let response = app.send(method, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(
            response.message(),
            Some("Missing or malformed authorization header"),
            "{uri}"
        );
    }
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .uri("/users/details")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.send_request(request).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_access_token() {
    let app = TestApp::new();
    let token = app.expired_access_token(1);

    let response = app
        .send(Method::GET, "/orders/my-orders", Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.message(),
        Some("Token has expired, please log in again")
    );
}

#[tokio::test]
async fn test_garbage_access_token() {
    let app = TestApp::new();

    let response = app
        .send(Method::GET, "/users/details", Some("not.a.jwt"), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), Some("Invalid token"));
}

#[tokio::test]
async fn test_forged_admin_flag_rejected() {
    let app = TestApp::new();
    let user = app.access_token(5, false);
    let admin = app.access_token(5, true);

    let user_parts: Vec<&str> = user.split('.').collect();
    let admin_parts: Vec<&str> = admin.split('.').collect();
    let forged = format!("{}.{}.{}", user_parts[0], admin_parts[1], user_parts[2]);

    let response = app
        .send(Method::GET, "/orders/all-orders", Some(&forged), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), Some("Invalid token"));
}

#[tokio::test]
async fn test_all_orders_requires_admin() {
    let app = TestApp::new();
    let token = app.access_token(2, false);

    let response = app
        .send(Method::GET, "/orders/all-orders", Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.message(), Some("Access denied. Admins only."));
}

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let app = TestApp::new();
    let token = app.access_token(2, false);

    let create = app
        .send(
            Method::POST,
            "/products",
            Some(&token),
            Some(json!({"name": "Lamp", "description": "Bright", "price": 10})),
        )
        .await;
    assert_eq!(create.status, StatusCode::FORBIDDEN);

    let promote = app
        .send(Method::PATCH, "/users/3/set-as-admin", Some(&token), None)
        .await;
    assert_eq!(promote.status, StatusCode::FORBIDDEN);

    let all_products = app
        .send(Method::GET, "/products/all", Some(&token), None)
        .await;
    assert_eq!(all_products.status, StatusCode::FORBIDDEN);
}
