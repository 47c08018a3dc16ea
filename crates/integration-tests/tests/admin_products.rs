//! Integration tests for the catalog and product uploads.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};

use tyhub_admin::cache::QueryKey;
use tyhub_integration_tests::{TestApp, location};

fn base_form(product_type: &str, price: &str) -> Form {
    Form::new()
        .text("title", "Canvas Tote")
        .text("description", "Heavy cotton tote bag")
        .text("type", product_type.to_string())
        .text("price", price.to_string())
}

fn upload(name: &str) -> Part {
    Part::bytes(b"binary-content".to_vec())
        .file_name(name.to_string())
        .mime_str("application/octet-stream")
        .unwrap()
}

#[tokio::test]
async fn test_catalog_filters() {
    let app = TestApp::start().await;
    app.login().await;

    let body = app.get("/products?type=digital").await.text().await.unwrap();
    assert!(body.contains("Font Pack"));
    assert!(!body.contains("Linen Shirt"));

    let body = app.get("/products?q=linen").await.text().await.unwrap();
    assert!(body.contains("Linen Shirt"));
    assert!(!body.contains("Font Pack"));
}

#[tokio::test]
async fn test_physical_product_without_images_is_accepted() {
    let app = TestApp::start().await;
    app.login().await;
    app.get("/products").await;

    let form = base_form("physical", "19.99")
        .text("stock", "5")
        .text("sizes", "S, M");
    let resp = app.post_multipart("/products", form).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/products");

    let uploads = app.api.uploads();
    let fields = uploads.last().unwrap();
    assert_eq!(
        fields,
        &["title", "description", "type", "price", "stock", "sizes", "sizes"]
    );
    assert_eq!(app.cache().is_stale(&QueryKey::Products).await, Some(true));

    let body = app.get("/products").await.text().await.unwrap();
    assert!(body.contains("Canvas Tote"));
}

#[tokio::test]
async fn test_digital_product_sends_one_file_and_no_images() {
    let app = TestApp::start().await;
    app.login().await;

    let form = base_form("digital", "9")
        .part("images", upload("cover.png"))
        .part("file", upload("tote-pattern.pdf"));
    let resp = app.post_multipart("/products", form).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let uploads = app.api.uploads();
    let fields = uploads.last().unwrap();
    assert_eq!(fields.iter().filter(|f| *f == "file").count(), 1);
    assert!(!fields.iter().any(|f| f == "images"));
    assert!(!fields.iter().any(|f| f == "stock"));
}

#[tokio::test]
async fn test_digital_product_requires_file() {
    let app = TestApp::start().await;
    app.login().await;

    let resp = app.post_multipart("/products", base_form("digital", "9")).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.text().await.unwrap().contains("Product file is required"));
    assert!(app.api.uploads().is_empty());
}

#[tokio::test]
async fn test_invalid_price_is_rejected_locally() {
    let app = TestApp::start().await;
    app.login().await;

    let resp = app.post_multipart("/products", base_form("physical", "0")).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Price must be greater than 0"));
    // The typed values are kept
    assert!(body.contains("Canvas Tote"));
    assert_eq!(app.api.call_count("POST /products/create"), 0);
}

#[tokio::test]
async fn test_edit_digital_product_keeps_existing_file() {
    let app = TestApp::start().await;
    app.login().await;

    let resp = app.get("/products/p-fonts/edit").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Font Pack"));

    let form = Form::new()
        .text("title", "Font Pack Deluxe")
        .text("description", "Twelve display typefaces")
        .text("type", "digital")
        .text("price", "12");
    let resp = app.post_multipart("/products/p-fonts", form).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.api.call_count("PUT /products/p-fonts"), 1);
    assert!(!app.api.uploads().last().unwrap().iter().any(|f| f == "file"));

    let body = app.get("/products").await.text().await.unwrap();
    assert!(body.contains("Font Pack Deluxe"));
}

#[tokio::test]
async fn test_delete_product() {
    let app = TestApp::start().await;
    app.login().await;

    let resp = app.post_form("/products/p-shirt/delete", &[]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.api.call_count("DELETE /products/p-shirt"), 1);

    let body = app.get("/products").await.text().await.unwrap();
    assert!(body.contains("Product deleted"));
    assert!(!body.contains("Linen Shirt"));
}
