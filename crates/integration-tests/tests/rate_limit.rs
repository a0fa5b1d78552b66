//! Credential endpoint rate limiting, keyed per client address.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request, StatusCode, header},
};
use tower::ServiceExt;

use emarket_integration_tests::{TestApp, test_config};

const PEER: &str = "192.0.2.10:40000";

fn login_request(forwarded_for: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/users/login")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = forwarded_for {
        builder = builder.header("x-forwarded-for", value);
    }

    let mut request = builder.body(Body::from("{}")).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(PEER.parse::<SocketAddr>().unwrap()));
    request
}

async fn login_statuses(
    trust_proxy: bool,
    forwarded_for: impl Fn(u8) -> Option<String>,
) -> Vec<StatusCode> {
    let mut config = test_config();
    config.rate_limit = true;
    config.trust_proxy = trust_proxy;
    let router = TestApp::with_config(config).router();

    let mut statuses = Vec::new();
    for i in 0..10 {
        let response = router
            .clone()
            .oneshot(login_request(forwarded_for(i)))
            .await
            .unwrap();
        statuses.push(response.status());
    }
    statuses
}

#[tokio::test]
async fn test_burst_then_limited() {
    let statuses = login_statuses(false, |_| None).await;

    assert!(statuses[..5].iter().all(|s| *s == StatusCode::BAD_REQUEST));
    assert!(statuses[5..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_rotating_forwarded_for_does_not_evade_limit() {
    let statuses = login_statuses(false, |i| Some(format!("198.51.100.{i}"))).await;

    assert!(statuses[5..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_trusted_proxy_keys_on_forwarded_for() {
    let statuses = login_statuses(true, |i| Some(format!("198.51.100.{i}"))).await;

    assert!(statuses.iter().all(|s| *s == StatusCode::BAD_REQUEST));
}
