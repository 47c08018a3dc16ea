//! Authentication route handlers for admin.
//!
//! Credentials are checked by the API; on success the returned user and
//! bearer token are stored in the session.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::forms::{FormErrors, LoginForm};
use crate::middleware::{OptionalAuth, clear_auth_session, remember_me_expiry, set_auth_session};
use crate::services::AuthService;
use crate::state::AppState;

use super::render;

const LOGIN_FAILED: &str = "Login failed. Please try again.";

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub remember_me: bool,
    pub errors: FormErrors,
    pub error: Option<String>,
}

impl LoginTemplate {
    fn empty() -> Self {
        Self {
            email: String::new(),
            remember_me: false,
            errors: FormErrors::new(),
            error: None,
        }
    }
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

/// Render the login page.
///
/// GET /login
async fn login_page(OptionalAuth(auth): OptionalAuth) -> Response {
    if auth.is_some() {
        return Redirect::to("/").into_response();
    }
    render(&LoginTemplate::empty()).into_response()
}

/// Sign in.
///
/// POST /login
#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let remember_me = form.remember_me.as_deref().is_some_and(|v| !v.is_empty());
    let rerender = |errors: FormErrors, error: Option<String>| LoginTemplate {
        email: form.email.trim().to_string(),
        remember_me,
        errors,
        error,
    };

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let page = render(&rerender(errors, None));
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let auth = match AuthService::new(&state).sign_in(&input).await {
        Ok(auth) if auth.is_valid() => auth,
        Ok(_) => {
            tracing::warn!("Sign-in response carried no access token");
            let page = render(&rerender(FormErrors::new(), Some(LOGIN_FAILED.to_string())));
            return Ok((StatusCode::UNAUTHORIZED, page).into_response());
        }
        Err(err) => {
            tracing::warn!(error = %err, "Sign-in failed");
            let status = match &err {
                ApiError::Rejected { status, .. } if *status < 500 => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            };
            let message = err.user_message().unwrap_or(LOGIN_FAILED).to_string();
            let page = render(&rerender(FormErrors::new(), Some(message)));
            return Ok((status, page).into_response());
        }
    };

    // New identity, new session id.
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to rotate session: {e}")))?;
    set_auth_session(&session, &auth)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store session: {e}")))?;
    if input.remember_me {
        session.set_expiry(Some(remember_me_expiry()));
    }

    set_sentry_user(auth.user.id.as_str(), Some(&auth.user.email));
    tracing::info!(user_id = %auth.user.id, "Admin signed in");

    Ok(Redirect::to("/").into_response())
}

/// Sign out and clear the session.
///
/// POST /logout
#[instrument(skip_all)]
async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> Redirect {
    if let Some(auth) = auth {
        AuthService::new(&state).sign_out(&auth).await;
    }

    if let Err(e) = clear_auth_session(&session).await {
        tracing::warn!(error = %e, "Failed to clear session on logout");
    }
    clear_sentry_user();

    Redirect::to("/login")
}
