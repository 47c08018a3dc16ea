//! Integration tests for admin sign-in, sign-out and session expiry.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use tyhub_admin::api::{Customer, Order, Product};
use tyhub_admin::cache::QueryKey;
use tyhub_core::OrderId;
use tyhub_integration_tests::{PENDING_ORDER, TEST_EMAIL, TEST_PASSWORD, TestApp, location};

#[tokio::test]
async fn test_pages_require_sign_in() {
    let app = TestApp::start().await;

    for path in ["/", "/products", "/orders", "/customers"] {
        let resp = app.get(path).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), "/login", "{path}");
    }
    assert!(app.api.calls().is_empty());
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::start().await;
    let resp = app.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_invalid_email_never_reaches_api() {
    let app = TestApp::start().await;

    let resp = app
        .post_form("/login", &[("email", "not-an-email"), ("password", TEST_PASSWORD)])
        .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Invalid email address"));
    assert_eq!(app.api.call_count("POST /users/signin"), 0);
}

#[tokio::test]
async fn test_short_password_never_reaches_api() {
    let app = TestApp::start().await;

    let resp = app
        .post_form("/login", &[("email", TEST_EMAIL), ("password", "12345")])
        .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Password must be at least 6 characters"));
    assert_eq!(app.api.call_count("POST /users/signin"), 0);
}

#[tokio::test]
async fn test_missing_fields_are_reported() {
    let app = TestApp::start().await;

    let resp = app.post_form("/login", &[("email", ""), ("password", "")]).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Email is required"));
    assert!(body.contains("Password is required"));
    assert!(app.api.calls().is_empty());
}

#[tokio::test]
async fn test_rejected_credentials_show_server_message() {
    let app = TestApp::start().await;

    let resp = app
        .post_form("/login", &[("email", TEST_EMAIL), ("password", "wrong-password")])
        .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Invalid email or password"));
    assert_eq!(app.api.call_count("POST /users/signin"), 1);

    // Still signed out
    let resp = app.get("/orders").await;
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn test_sign_in_opens_dashboard() {
    let app = TestApp::start().await;
    app.login().await;
    assert!(app.has_session_cookie());

    let resp = app.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Linen Shirt"));
    assert!(body.contains("Tess Admin"));

    // Signed-in users skip the login page
    let resp = app.get("/login").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
async fn test_logout_ends_session_and_clears_cache() {
    let app = TestApp::start().await;
    app.login().await;
    assert_eq!(app.get("/products").await.status(), StatusCode::OK);
    assert!(
        app.cache()
            .peek::<Vec<Product>>(&QueryKey::Products)
            .await
            .is_some()
    );

    let resp = app.post_form("/logout", &[]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
    assert_eq!(app.api.call_count("POST /users/logout"), 1);
    assert!(
        app.cache()
            .peek::<Vec<Product>>(&QueryKey::Products)
            .await
            .is_none()
    );

    let resp = app.get("/products").await;
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn test_expired_token_redirects_to_login_once() {
    let app = TestApp::start().await;
    app.login().await;
    app.api.revoke_token();

    let resp = app.get("/orders").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
    assert_eq!(app.api.call_count("GET /orders"), 1);

    // The session is gone: no second API call, and the login page renders.
    let resp = app.get("/orders").await;
    assert_eq!(location(&resp), "/login");
    assert_eq!(app.api.call_count("GET /orders"), 1);

    let resp = app.get("/login").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_during_status_update_rolls_back() {
    let app = TestApp::start().await;
    app.login().await;
    assert_eq!(app.get(&format!("/orders/{PENDING_ORDER}")).await.status(), StatusCode::OK);
    app.api.revoke_token();

    let resp = app
        .post_form(&format!("/orders/{PENDING_ORDER}/status"), &[("status", "shipped")])
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");

    assert_eq!(app.api.order_status(PENDING_ORDER).as_deref(), Some("pending"));
    // The expired session takes its cached data with it
    assert!(
        app.cache()
            .peek::<Order>(&QueryKey::Order(OrderId::new(PENDING_ORDER)))
            .await
            .is_none()
    );

    let resp = app.get("/orders").await;
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn test_revoked_token_cannot_read_cached_pages() {
    let app = TestApp::start().await;
    app.login().await;
    assert_eq!(app.get("/customers").await.status(), StatusCode::OK);
    app.api.revoke_token();

    let resp = app.get("/customers").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
    assert_eq!(app.api.call_count("GET /users"), 2);
    assert!(
        app.cache()
            .peek::<Vec<Customer>>(&QueryKey::Customers)
            .await
            .is_none()
    );
}
