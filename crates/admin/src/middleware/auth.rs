//! Authentication middleware and extractors for admin.
//!
//! The signed-in state is the [`AuthSession`] record stored in the session.
//! Handlers receive it as a [`SessionContext`] through [`RequireAuth`] and
//! pass it explicitly to every API call.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{SessionExpired, clear_sentry_user};
use crate::models::{AuthSession, Flash, SessionContext, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// If nobody is signed in, redirects to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(session): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", session.user().username)
/// }
/// ```
pub struct RequireAuth(pub SessionContext);

/// Rejection when a page requires a signed-in user: a redirect to login.
pub struct LoginRequired;

impl IntoResponse for LoginRequired {
    fn into_response(self) -> Response {
        Redirect::to("/login").into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = LoginRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts.extensions.get::<Session>().ok_or(LoginRequired)?;
        let auth = current_auth_session(session).await.ok_or(LoginRequired)?;

        Ok(Self(auth.context()))
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<SessionContext>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>() {
            Some(session) => current_auth_session(session).await,
            None => None,
        };

        Ok(Self(auth.map(|a| a.context())))
    }
}

/// Read the stored authentication record.
///
/// A record without a usable token is removed and treated as absent.
pub async fn current_auth_session(session: &Session) -> Option<AuthSession> {
    let auth: AuthSession = session.get(session_keys::AUTH).await.ok().flatten()?;

    if auth.is_valid() {
        Some(auth)
    } else {
        if let Err(e) = clear_auth_session(session).await {
            tracing::warn!(error = %e, "Failed to clear session without token");
        }
        None
    }
}

/// Store the authentication record, replacing any existing one.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_auth_session(
    session: &Session,
    auth: &AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::AUTH, auth).await
}

/// Remove the authentication record (logout or expired token).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<AuthSession>(session_keys::AUTH).await?;
    Ok(())
}

/// End the session when a handler reports that the API rejected its token.
///
/// Handlers signal this by returning a response carrying the
/// [`SessionExpired`] extension (see `AppError::SessionExpired`); that
/// response is already the redirect to the login page. Everything cached
/// for the user is dropped with the session.
pub async fn expire_session_on_unauthorized(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if response.extensions().get::<SessionExpired>().is_some() {
        if let Some(auth) = current_auth_session(&session).await {
            state.caches().evict(&auth.user.id);
        }
        if let Err(e) = clear_auth_session(&session).await {
            tracing::warn!(error = %e, "Failed to clear expired session");
        }
        clear_sentry_user();
        tracing::info!("Session expired by API, cleared");
    }

    response
}

/// Queue a message for the next page view.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the queued message, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;
    use tyhub_core::UserId;

    use super::*;
    use crate::api::SessionUser;
    use crate::models::AccessToken;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn record(token: &str) -> AuthSession {
        let user = SessionUser {
            id: UserId::new("u1"),
            email: "admin@tyhub.com".to_string(),
            username: "admin".to_string(),
            role: "admin".to_string(),
            address: None,
            profile_picture: None,
        };
        AuthSession::new(user, AccessToken::new(token))
    }

    #[tokio::test]
    async fn test_record_without_token_is_cleared() {
        let session = session();
        set_auth_session(&session, &record("")).await.unwrap();

        assert!(current_auth_session(&session).await.is_none());
        let stored: Option<AuthSession> = session.get(session_keys::AUTH).await.unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_signed_in_record_is_returned() {
        let session = session();
        set_auth_session(&session, &record("tok")).await.unwrap();

        let auth = current_auth_session(&session).await.unwrap();
        assert_eq!(auth.user.id, UserId::new("u1"));

        clear_auth_session(&session).await.unwrap();
        assert!(current_auth_session(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_flash_is_shown_once() {
        let session = session();
        set_flash(&session, Flash::success("Saved")).await;

        let flash = take_flash(&session).await.unwrap();
        assert!(!flash.is_error());
        assert!(take_flash(&session).await.is_none());
    }
}
