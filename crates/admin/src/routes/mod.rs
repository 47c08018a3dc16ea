//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Health check
//!
//! # Auth (credentials checked by the API)
//! GET  /login                      - Login page
//! POST /login                      - Sign in
//! POST /logout                     - Sign out
//!
//! # Products
//! GET  /                           - Product listing (home)
//! GET  /products                   - Product listing
//! GET  /products/new               - Add product form
//! POST /products                   - Create product (multipart)
//! GET  /products/{id}/edit         - Edit product form
//! POST /products/{id}              - Update product (multipart)
//! POST /products/{id}/delete       - Delete product
//!
//! # Orders
//! GET  /orders                     - Order listing
//! GET  /orders/{id}                - Order detail
//! POST /orders/{id}/status         - Update order status (optimistic)
//! POST /orders/{id}/delete         - Delete order
//!
//! # Customers
//! GET  /customers                  - Customer listing
//! GET  /customers/{id}             - Customer detail
//! ```

pub mod auth;
pub mod customers;
pub mod orders;
pub mod products;

use askama::Template;
use axum::{
    Router,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tower_http::services::ServeDir;

use crate::api::{ApiError, SessionUser};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{create_session_layer, expire_session_on_unauthorized};
use crate::models::SessionContext;
use crate::state::AppState;

/// Signed-in user shown in the page header.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub username: String,
    pub email: String,
    pub role: String,
    pub avatar_url: Option<String>,
}

impl From<&SessionUser> for AdminUserView {
    fn from(user: &SessionUser) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            avatar_url: user.profile_picture.clone(),
        }
    }
}

impl From<&SessionContext> for AdminUserView {
    fn from(session: &SessionContext) -> Self {
        Self::from(session.user())
    }
}

/// All page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(customers::router())
}

/// The complete application: pages, static files and session handling.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .nest_service(
            "/static",
            ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        )
        .layer(from_fn_with_state(
            state.clone(),
            expire_session_on_unauthorized,
        ))
        .layer(session_layer)
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the API.
async fn health() -> &'static str {
    "ok"
}

/// Render a template, logging failures.
fn render<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Turn a failed page load into the message shown on the page.
///
/// A rejected session is not a page error: it ends the session instead.
fn load_error(err: ApiError, what: &str) -> Result<String, AppError> {
    match err {
        ApiError::Unauthorized => Err(AppError::SessionExpired),
        err => {
            tracing::error!(error = %err, "Failed to load {what}");
            Ok(format!("Error loading {what}"))
        }
    }
}

/// Message for a failed mutation.
///
/// Uses the server's message when it sent one.
fn mutation_error(err: ApiError, fallback: &str) -> Result<String, AppError> {
    match err {
        ApiError::Unauthorized => Err(AppError::SessionExpired),
        err => {
            tracing::warn!(error = %err, "{fallback}");
            Ok(err
                .user_message()
                .map_or_else(|| fallback.to_string(), str::to_string))
        }
    }
}

/// Status of the page re-rendered after a failed mutation.
const fn failure_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Rejected { status, .. } if *status < 500 => StatusCode::UNPROCESSABLE_ENTITY,
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Page shown when a single record cannot be loaded.
fn detail_error(
    err: ApiError,
    what: &str,
    admin_user: AdminUserView,
    back: (&'static str, &'static str),
) -> Result<Response, AppError> {
    let (status, title, message) = match err {
        ApiError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            "Not found",
            format!("This {what} does not exist or was deleted."),
        ),
        err => (
            StatusCode::BAD_GATEWAY,
            "Something went wrong",
            load_error(err, what)?,
        ),
    };

    let page = ErrorPageTemplate {
        admin_user,
        current_path: back.0.to_string(),
        title: title.to_string(),
        message,
        back_href: back.0,
        back_label: back.1,
    };
    Ok((status, render(&page)).into_response())
}

/// An `<option>` in a select input.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Error page template.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPageTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub title: String,
    pub message: String,
    pub back_href: &'static str,
    pub back_label: &'static str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_expires_session_on_unauthorized() {
        assert!(matches!(
            load_error(ApiError::Unauthorized, "orders"),
            Err(AppError::SessionExpired)
        ));
        assert_eq!(
            load_error(ApiError::NotFound(String::new()), "orders").unwrap(),
            "Error loading orders"
        );
    }

    #[test]
    fn test_detail_error_not_found_is_404() {
        let admin_user = AdminUserView {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            role: "admin".to_string(),
            avatar_url: None,
        };
        let response = detail_error(
            ApiError::NotFound("order 1".to_string()),
            "order",
            admin_user,
            ("/orders", "Back to orders"),
        )
        .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_mutation_error_prefers_server_message() {
        let err = ApiError::Rejected {
            status: 400,
            message: "Cannot cancel a delivered order".to_string(),
        };
        assert_eq!(
            mutation_error(err, "Failed to update order status").unwrap(),
            "Cannot cancel a delivered order"
        );

        let err = ApiError::Rejected {
            status: 500,
            message: String::new(),
        };
        assert_eq!(
            mutation_error(err, "Failed to update order status").unwrap(),
            "Failed to update order status"
        );
    }
}
