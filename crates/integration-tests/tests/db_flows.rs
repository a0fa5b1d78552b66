//! Account, cart and checkout flows against a migrated `PostgreSQL` database.
//!
//! Set `EMARKET_TEST_DATABASE_URL` and run with `--ignored`.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use emarket_integration_tests::{TEST_PASSWORD, TestApp};

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at EMARKET_TEST_DATABASE_URL"]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::with_database().await;
    let email = TestApp::unique_email("dup");
    app.register(&email).await;

    let response = app
        .send(
            Method::POST,
            "/users/register",
            None,
            Some(json!({
                "firstName": "Other",
                "lastName": "Person",
                "email": email.to_uppercase(),
                "mobileNo": "09170000000",
                "password": TEST_PASSWORD,
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(
        response.message(),
        Some("An account with this email already exists")
    );

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(&email)
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at EMARKET_TEST_DATABASE_URL"]
async fn test_confirm_email_then_repeat_click() {
    let app = TestApp::with_database().await;
    let user = app.register(&TestApp::unique_email("confirm")).await;
    let token = app.confirmation_token(user.id).await.unwrap();
    let uri = format!("/users/confirm-email/{token}");

    let first = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.message(), Some("Email confirmed successfully."));
    assert_eq!(app.confirmation_token(user.id).await, None);

    let confirmed: bool =
        sqlx::query_scalar("SELECT email_confirmed FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_one(app.pool())
            .await
            .unwrap();
    assert!(confirmed);

    let repeat = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(repeat.status, StatusCode::OK);
    assert_eq!(repeat.message(), Some("Email has already been confirmed."));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at EMARKET_TEST_DATABASE_URL"]
async fn test_unconfirmed_login_forbidden_whatever_the_password() {
    let app = TestApp::with_database().await;
    let user = app.register(&TestApp::unique_email("unconfirmed")).await;

    for password in [TEST_PASSWORD, "wrong-password"] {
        let response = app.login(&user.email, password).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(
            response.message(),
            Some("Please confirm your email before logging in")
        );
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at EMARKET_TEST_DATABASE_URL"]
async fn test_login_token_opens_details() {
    let app = TestApp::with_database().await;
    let (user, access) = app.confirmed_user("details").await;

    let wrong = app.login(&user.email, "wrong-password").await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let response = app
        .send(Method::GET, "/users/details", Some(&access), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], user.id);
    assert_eq!(response.body["email"], user.email.as_str());
    assert_eq!(response.body["emailConfirmed"], true);
    assert!(response.body.get("passwordHash").is_none());
}

// ============================================================================
// Carts and checkout
// ============================================================================

async fn add_to_cart(
    app: &TestApp,
    access: &str,
    product_id: i32,
    quantity: i64,
) -> StatusCode {
    app.send(
        Method::POST,
        "/carts/add-to-cart",
        Some(access),
        Some(json!({"productId": product_id, "quantity": quantity})),
    )
    .await
    .status
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at EMARKET_TEST_DATABASE_URL"]
async fn test_empty_cart_checkout_creates_no_order() {
    let app = TestApp::with_database().await;
    let (user, access) = app.confirmed_user("empty-cart").await;

    let none = app
        .send(Method::POST, "/orders/checkout", Some(&access), None)
        .await;
    assert_eq!(none.status, StatusCode::NOT_FOUND);
    assert_eq!(none.message(), Some("No cart found for the user."));

    let cart = app
        .send(Method::GET, "/carts/get-cart", Some(&access), None)
        .await;
    assert_eq!(cart.status, StatusCode::OK);

    let empty = app
        .send(Method::POST, "/orders/checkout", Some(&access), None)
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.message(), Some("No items to checkout."));
    assert_eq!(app.order_count(user.id).await, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at EMARKET_TEST_DATABASE_URL"]
async fn test_checkout_snapshots_cart_and_empties_it() {
    let app = TestApp::with_database().await;
    let (user, access) = app.confirmed_user("checkout").await;
    let lamp = app.insert_product("Desk lamp", "10.00").await;
    let bulb = app.insert_product("Bulb", "2.50").await;

    assert_eq!(add_to_cart(&app, &access, lamp, 2).await, StatusCode::OK);
    assert_eq!(add_to_cart(&app, &access, bulb, 1).await, StatusCode::OK);
    assert_eq!(add_to_cart(&app, &access, lamp, 1).await, StatusCode::OK);

    let response = app
        .send(Method::POST, "/orders/checkout", Some(&access), None)
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.message(), Some("Order successfully placed"));

    let order = &response.body["order"];
    assert_eq!(order["totalPrice"], 32.5);
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["productsOrdered"].as_array().unwrap().len(), 2);
    assert_eq!(order["productsOrdered"][0]["quantity"], 3);
    assert_eq!(app.order_count(user.id).await, 1);

    let cart = app
        .send(Method::GET, "/carts/get-cart", Some(&access), None)
        .await;
    assert_eq!(cart.body["cart"]["totalPrice"], 0.0);
    assert_eq!(cart.body["cart"]["cartItems"], json!([]));

    let orders = app
        .send(Method::GET, "/orders/my-orders", Some(&access), None)
        .await;
    assert_eq!(orders.status, StatusCode::OK);
    assert_eq!(orders.body.as_array().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires PostgreSQL at EMARKET_TEST_DATABASE_URL"]
async fn test_concurrent_checkouts_place_one_order() {
    let app = TestApp::with_database().await;
    let (user, access) = app.confirmed_user("concurrent").await;
    let product = app.insert_product("Mug", "7.25").await;
    assert_eq!(add_to_cart(&app, &access, product, 4).await, StatusCode::OK);

    let (first, second) = tokio::join!(
        app.send(Method::POST, "/orders/checkout", Some(&access), None),
        app.send(Method::POST, "/orders/checkout", Some(&access), None),
    );

    let mut statuses = [first.status, second.status];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);
    assert_eq!(app.order_count(user.id).await, 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at EMARKET_TEST_DATABASE_URL"]
async fn test_unstorable_cart_total_is_rejected() {
    let app = TestApp::with_database().await;
    let (_, access) = app.confirmed_user("overflow").await;
    let product = app.insert_product("Crate", "10.00").await;

    let response = app
        .send(
            Method::POST,
            "/carts/add-to-cart",
            Some(&access),
            Some(json!({"productId": product, "quantity": 2_000_000_000})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), Some("Cart total is too large"));

    let cart = app
        .send(Method::GET, "/carts/get-cart", Some(&access), None)
        .await;
    assert_eq!(cart.body["cart"]["cartItems"], json!([]));
}
