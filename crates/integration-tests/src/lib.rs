//! Integration tests for TyHub Admin.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tyhub-integration-tests
//! ```
//!
//! Nothing external is needed: [`FakeApi`] serves an in-memory version of
//! the TyHub REST API on an ephemeral port, and [`TestApp`] runs the real
//! admin router against it.
//!
//! # Example
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_orders_page() {
//!     let app = TestApp::start().await;
//!     app.login().await;
//!     let resp = app.get("/orders").await;
//!     assert_eq!(resp.status(), 200);
//! }
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Request, State},
    http::{StatusCode, header},
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

use tyhub_admin::cache::QueryCache;
use tyhub_admin::config::{AdminConfig, ApiConfig, CacheConfig};
use tyhub_admin::middleware::SESSION_COOKIE_NAME;
use tyhub_admin::routes;
use tyhub_admin::state::AppState;
use tyhub_core::UserId;

/// Email accepted by the fake API.
pub const TEST_EMAIL: &str = "admin@tyhub.test";
/// Password accepted by the fake API.
pub const TEST_PASSWORD: &str = "correct-horse";
/// Bearer token issued on sign-in.
pub const TEST_TOKEN: &str = "test-token-123";
/// Id of the user the fake API signs in.
pub const TEST_USER_ID: &str = "u-admin";

/// Seeded order ids.
pub const PENDING_ORDER: &str = "665f1c2e9b1d8a0012ab0001";
pub const SHIPPED_ORDER: &str = "665f1c2e9b1d8a0012ab0002";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Fake REST API
// =============================================================================

#[derive(Default)]
struct FakeApiState {
    calls: Mutex<Vec<String>>,
    orders: Mutex<Vec<Value>>,
    products: Mutex<Vec<Value>>,
    customers: Mutex<Vec<Value>>,
    uploads: Mutex<Vec<Vec<String>>>,
    reject_status_updates: AtomicBool,
    token_revoked: AtomicBool,
}

type Shared = Arc<FakeApiState>;

/// In-memory TyHub REST API.
#[derive(Clone)]
pub struct FakeApi {
    state: Shared,
    base_url: Url,
}

impl FakeApi {
    /// Seed the fake API and serve it on an ephemeral port.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(FakeApiState::default());
        seed(&state);

        let protected = Router::new()
            .route("/users/logout", post(sign_out))
            .route("/users", get(list_customers))
            .route("/users/customer/{id}", get(get_customer))
            .route("/products", get(list_products))
            .route("/products/create", post(create_product))
            .route("/products/{id}", put(update_product).delete(delete_product))
            .route("/orders", get(list_orders))
            .route("/orders/{id}", get(get_order).delete(delete_order))
            .route("/orders/{id}/status", put(update_order_status))
            .route_layer(from_fn_with_state(state.clone(), require_token));

        let api = Router::new()
            .route("/users/signin", post(sign_in))
            .merge(protected);

        let router = Router::new()
            .nest("/api/v1", api)
            .layer(from_fn_with_state(state.clone(), record_call))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake API");
        let addr = listener.local_addr().expect("Fake API has no address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/api/v1/")).expect("Invalid fake API URL");
        Self { state, base_url }
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Every request received so far, as `"METHOD /path"`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state.calls).clone()
    }

    /// How many times `call` (`"METHOD /path"`) was received.
    #[must_use]
    pub fn call_count(&self, call: &str) -> usize {
        lock(&self.state.calls).iter().filter(|c| *c == call).count()
    }

    /// Field names of each multipart upload, in the order they were sent.
    #[must_use]
    pub fn uploads(&self) -> Vec<Vec<String>> {
        lock(&self.state.uploads).clone()
    }

    /// Make `PUT /orders/:id/status` answer 400.
    pub fn reject_status_updates(&self, reject: bool) {
        self.state.reject_status_updates.store(reject, Ordering::SeqCst);
    }

    /// Answer 401 to every bearer request from now on.
    pub fn revoke_token(&self) {
        self.state.token_revoked.store(true, Ordering::SeqCst);
    }

    /// Status of a stored order.
    #[must_use]
    pub fn order_status(&self, id: &str) -> Option<String> {
        lock(&self.state.orders)
            .iter()
            .find(|o| o["_id"] == id)
            .and_then(|o| o["status"].as_str().map(str::to_string))
    }
}

fn order_json(id: &str, customer: (&str, &str, &str), status: &str, quantity: u32) -> Value {
    json!({
        "_id": id,
        "user": { "_id": customer.0, "name": customer.1, "email": customer.2 },
        "items": [{
            "product": { "_id": "p-shirt", "title": "Linen Shirt", "price": 25.0, "type": "physical" },
            "quantity": quantity,
            "price": 25.0
        }],
        "totalAmount": 25.0 * f64::from(quantity),
        "status": status,
        "paymentInfo": { "method": "card", "reference": "pi_123" },
        "isDigital": false,
        "createdAt": "2024-05-01T10:00:00Z",
        "updatedAt": "2024-05-02T09:30:00Z"
    })
}

fn seed(state: &FakeApiState) {
    let ada = ("c-ada", "Ada Lovelace", "ada@example.com");
    let grace = ("c-grace", "Grace Hopper", "grace@example.com");

    let pending = order_json(PENDING_ORDER, ada, "pending", 2);
    let shipped = order_json(SHIPPED_ORDER, grace, "shipped", 1);

    *lock(&state.customers) = vec![
        json!({
            "_id": ada.0, "username": ada.1, "email": ada.2,
            "phone": "+44 20 7946 0000", "address": "12 Analytical Way",
            "role": "customer",
            "createdAt": "2024-03-09T08:00:00Z", "updatedAt": "2024-05-01T10:00:00Z",
            "orders": [pending.clone()]
        }),
        json!({
            "_id": grace.0, "username": grace.1, "email": grace.2,
            "role": "customer",
            "createdAt": "2024-04-01T08:00:00Z", "updatedAt": "2024-04-01T08:00:00Z",
            "orders": [shipped.clone()]
        }),
    ];
    *lock(&state.orders) = vec![pending, shipped];
    *lock(&state.products) = vec![
        json!({
            "_id": "p-shirt", "title": "Linen Shirt",
            "description": "Breathable summer shirt",
            "price": 25.0, "type": "physical", "stock": 12,
            "images": [{ "url": "https://cdn.example.com/shirt.jpg", "publicId": "shirt" }],
            "sizes": ["S", "M", "L"], "colors": ["White"]
        }),
        json!({
            "_id": "p-fonts", "title": "Font Pack",
            "description": "Twelve display typefaces",
            "price": 9.0, "type": "digital",
            "file": { "url": "https://cdn.example.com/fonts.zip" }
        }),
    ];
}

async fn record_call(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let path = request.uri().path().trim_start_matches("/api/v1").to_string();
    lock(&state.calls).push(format!("{} {path}", request.method()));
    next.run(request).await
}

async fn require_token(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let expected = format!("Bearer {TEST_TOKEN}");
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);

    if !authorized || state.token_revoked.load(Ordering::SeqCst) {
        return message(StatusCode::UNAUTHORIZED, "Token expired");
    }
    next.run(request).await
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

#[derive(Deserialize)]
struct SignInBody {
    email: String,
    password: String,
}

async fn sign_in(Json(body): Json<SignInBody>) -> Response {
    if body.email != TEST_EMAIL || body.password != TEST_PASSWORD {
        return message(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    Json(json!({
        "user": {
            "id": TEST_USER_ID,
            "email": TEST_EMAIL,
            "username": "Tess Admin",
            "role": "admin"
        },
        "accessToken": TEST_TOKEN
    }))
    .into_response()
}

async fn sign_out() -> Response {
    message(StatusCode::OK, "Logged out")
}

async fn list_customers(State(state): State<Shared>) -> Json<Value> {
    let customers = lock(&state.customers).clone();
    Json(json!({ "customers": customers }))
}

async fn get_customer(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    lock(&state.customers)
        .iter()
        .find(|c| c["_id"] == id.as_str())
        .map_or_else(
            || message(StatusCode::NOT_FOUND, "Customer not found"),
            |c| Json(json!({ "customer": c })).into_response(),
        )
}

async fn list_products(State(state): State<Shared>) -> Json<Value> {
    let products = lock(&state.products).clone();
    Json(json!({ "products": products }))
}

/// Read an upload, recording its field names.
async fn read_upload(state: &FakeApiState, mut multipart: Multipart) -> Value {
    let mut names = Vec::new();
    let mut product = json!({ "sizes": [], "colors": [], "images": [] });

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        names.push(name.clone());
        match name.as_str() {
            "images" | "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let _ = field.bytes().await;
                let asset = json!({ "url": format!("https://cdn.example.com/{file_name}") });
                if name == "file" {
                    product["file"] = asset;
                } else if let Some(images) = product["images"].as_array_mut() {
                    images.push(asset);
                }
            }
            "sizes" | "colors" => {
                let value = field.text().await.unwrap_or_default();
                if let Some(list) = product[name.as_str()].as_array_mut() {
                    list.push(Value::String(value));
                }
            }
            "price" => {
                let value = field.text().await.unwrap_or_default();
                product["price"] = value.parse::<f64>().map_or(Value::Null, |n| json!(n));
            }
            "stock" => {
                let value = field.text().await.unwrap_or_default();
                product["stock"] = value.parse::<u64>().map_or(Value::Null, |n| json!(n));
            }
            _ => {
                product[name.as_str()] = Value::String(field.text().await.unwrap_or_default());
            }
        }
    }

    lock(&state.uploads).push(names);
    product
}

async fn create_product(State(state): State<Shared>, multipart: Multipart) -> Response {
    let mut product = read_upload(&state, multipart).await;
    let id = format!("p-new-{}", lock(&state.products).len());
    product["_id"] = Value::String(id);

    lock(&state.products).push(product.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "product": product, "message": "Product created" })),
    )
        .into_response()
}

async fn update_product(
    State(state): State<Shared>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let mut update = read_upload(&state, multipart).await;
    let mut products = lock(&state.products);
    let Some(product) = products.iter_mut().find(|p| p["_id"] == id.as_str()) else {
        return message(StatusCode::NOT_FOUND, "Product not found");
    };

    update["_id"] = Value::String(id);
    if update.get("file").is_none() {
        update["file"] = product["file"].clone();
    }
    *product = update.clone();
    Json(json!({ "product": update, "message": "Product updated" })).into_response()
}

async fn delete_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    lock(&state.products).retain(|p| p["_id"] != id.as_str());
    message(StatusCode::OK, "Product deleted")
}

async fn list_orders(State(state): State<Shared>) -> Json<Value> {
    let orders = lock(&state.orders).clone();
    Json(json!({ "total": orders.len(), "data": orders }))
}

async fn get_order(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    lock(&state.orders)
        .iter()
        .find(|o| o["_id"] == id.as_str())
        .map_or_else(
            || message(StatusCode::NOT_FOUND, "Order not found"),
            |o| Json(o.clone()).into_response(),
        )
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
}

async fn update_order_status(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Response {
    if state.reject_status_updates.load(Ordering::SeqCst) {
        return message(StatusCode::BAD_REQUEST, "Status change not allowed");
    }

    let mut orders = lock(&state.orders);
    let Some(order) = orders.iter_mut().find(|o| o["_id"] == id.as_str()) else {
        return message(StatusCode::NOT_FOUND, "Order not found");
    };
    order["status"] = Value::String(body.status);
    Json(order.clone()).into_response()
}

async fn delete_order(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    lock(&state.orders).retain(|o| o["_id"] != id.as_str());
    message(StatusCode::OK, "Order deleted")
}

// =============================================================================
// Admin under test
// =============================================================================

/// The admin app running against a [`FakeApi`].
///
/// Redirects are not followed so tests can assert on them. The session
/// cookie is carried between requests like a browser would.
pub struct TestApp {
    pub api: FakeApi,
    pub state: AppState,
    base_url: String,
    client: reqwest::Client,
    cookie: Mutex<Option<String>>,
}

impl TestApp {
    /// Start a fake API and an admin server pointed at it.
    pub async fn start() -> Self {
        let api = FakeApi::start().await;
        let state = AppState::new(test_config(api.base_url().clone()))
            .expect("Failed to create application state");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind admin");
        let addr = listener.local_addr().expect("Admin has no address");
        let app = routes::app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api,
            state,
            base_url: format!("http://{addr}"),
            client,
            cookie: Mutex::new(None),
        }
    }

    /// Query cache of the signed-in test user.
    #[must_use]
    pub fn cache(&self) -> QueryCache {
        self.state.cache_for(&UserId::new(TEST_USER_ID))
    }

    /// Whether the client currently holds a session cookie.
    #[must_use]
    pub fn has_session_cookie(&self) -> bool {
        lock(&self.cookie).is_some()
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.send(self.client.get(self.url(path))).await
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.send(self.client.post(self.url(path)).form(form)).await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> reqwest::Response {
        self.send(self.client.post(self.url(path)).multipart(form))
            .await
    }

    /// Sign in with the fake API's credentials.
    pub async fn login(&self) {
        let resp = self
            .post_form(
                "/login",
                &[("email", TEST_EMAIL), ("password", TEST_PASSWORD)],
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER, "login failed");
        assert_eq!(location(&resp), "/");
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> reqwest::Response {
        let cookie = lock(&self.cookie).clone();
        let request = match cookie {
            Some(cookie) => request.header(reqwest::header::COOKIE, cookie),
            None => request,
        };

        let response = request.send().await.expect("Request to admin failed");
        self.store_cookie(&response);
        response
    }

    fn store_cookie(&self, response: &reqwest::Response) {
        for value in response.headers().get_all(reqwest::header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            let Some(pair) = value.split(';').next() else { continue };
            let Some((name, id)) = pair.split_once('=') else { continue };
            if name.trim() != SESSION_COOKIE_NAME {
                continue;
            }

            let removed = id.is_empty() || value.to_ascii_lowercase().contains("max-age=0");
            *lock(&self.cookie) = (!removed).then(|| pair.trim().to_string());
        }
    }
}

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn test_config(api_base_url: Url) -> AdminConfig {
    AdminConfig {
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        session_expiry_hours: 24,
        api: ApiConfig {
            base_url: api_base_url,
            timeout: Duration::from_secs(5),
        },
        cache: CacheConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    }
}
