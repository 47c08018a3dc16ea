//! Integration tests for order pages and the optimistic status update.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use tyhub_admin::api::Order;
use tyhub_admin::cache::QueryKey;
use tyhub_core::{OrderId, OrderStatus};
use tyhub_integration_tests::{PENDING_ORDER, SHIPPED_ORDER, TestApp, location};

fn order_key() -> QueryKey {
    QueryKey::Order(OrderId::new(PENDING_ORDER))
}

#[tokio::test]
async fn test_orders_table_lists_and_filters() {
    let app = TestApp::start().await;
    app.login().await;

    let body = app.get("/orders").await.text().await.unwrap();
    assert!(body.contains("Ada Lovelace"));
    assert!(body.contains("Grace Hopper"));

    let body = app.get("/orders?status=shipped").await.text().await.unwrap();
    assert!(body.contains("Grace Hopper"));
    assert!(!body.contains("Ada Lovelace"));

    let body = app.get("/orders?q=ada%40example").await.text().await.unwrap();
    assert!(body.contains("Ada Lovelace"));
    assert!(!body.contains("Grace Hopper"));

    // Every view revalidates the list with the caller's token
    assert_eq!(app.api.call_count("GET /orders"), 3);
}

#[tokio::test]
async fn test_order_detail() {
    let app = TestApp::start().await;
    app.login().await;

    let resp = app.get(&format!("/orders/{SHIPPED_ORDER}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Grace Hopper"));
    assert!(body.contains("Linen Shirt"));
    assert!(body.contains("$25.00"));
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = TestApp::start().await;
    app.login().await;

    let resp = app.get("/orders/does-not-exist").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rejected_status_update_restores_cached_order() {
    let app = TestApp::start().await;
    app.login().await;
    assert_eq!(app.get(&format!("/orders/{PENDING_ORDER}")).await.status(), StatusCode::OK);
    app.api.reject_status_updates(true);

    let resp = app
        .post_form(&format!("/orders/{PENDING_ORDER}/status"), &[("status", "delivered")])
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/orders/{PENDING_ORDER}"));

    let cache = app.cache();
    let cached = cache.peek::<Order>(&order_key()).await.unwrap();
    assert_eq!(cached.status, OrderStatus::Pending);
    assert_eq!(cache.is_stale(&order_key()).await, Some(false));
    assert_eq!(app.api.order_status(PENDING_ORDER).as_deref(), Some("pending"));

    let body = app
        .get(&format!("/orders/{PENDING_ORDER}"))
        .await
        .text()
        .await
        .unwrap();
    assert!(body.contains("Status change not allowed"));
    assert!(body.contains("Pending"));
    assert_eq!(app.api.call_count(&format!("GET /orders/{PENDING_ORDER}")), 2);
}

#[tokio::test]
async fn test_accepted_status_update_invalidates_and_refetches() {
    let app = TestApp::start().await;
    app.login().await;
    assert_eq!(app.get("/orders").await.status(), StatusCode::OK);
    assert_eq!(app.get(&format!("/orders/{PENDING_ORDER}")).await.status(), StatusCode::OK);

    let resp = app
        .post_form(&format!("/orders/{PENDING_ORDER}/status"), &[("status", "shipped")])
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.api.call_count(&format!("PUT /orders/{PENDING_ORDER}/status")), 1);

    let cache = app.cache();
    assert_eq!(cache.is_stale(&order_key()).await, Some(true));
    assert_eq!(cache.is_stale(&QueryKey::Orders).await, Some(true));

    let body = app
        .get(&format!("/orders/{PENDING_ORDER}"))
        .await
        .text()
        .await
        .unwrap();
    assert!(body.contains("Order status updated to Shipped"));
    assert_eq!(app.api.call_count(&format!("GET /orders/{PENDING_ORDER}")), 2);
    assert_eq!(cache.is_stale(&order_key()).await, Some(false));

    app.get("/orders").await;
    assert_eq!(app.api.call_count("GET /orders"), 2);
}

#[tokio::test]
async fn test_unknown_status_is_bad_request() {
    let app = TestApp::start().await;
    app.login().await;

    let resp = app
        .post_form(&format!("/orders/{PENDING_ORDER}/status"), &[("status", "lost")])
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.api.call_count(&format!("PUT /orders/{PENDING_ORDER}/status")), 0);
}

#[tokio::test]
async fn test_delete_order() {
    let app = TestApp::start().await;
    app.login().await;
    app.get("/orders").await;

    let resp = app.post_form(&format!("/orders/{SHIPPED_ORDER}/delete"), &[]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/orders");

    let body = app.get("/orders").await.text().await.unwrap();
    assert!(body.contains("Order deleted"));
    assert!(!body.contains("Grace Hopper"));
}
