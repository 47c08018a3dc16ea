//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::api::ApiError;
use crate::forms::FormErrors;

/// Response extension marking a response that ends the current session.
///
/// Set when the API rejected the session's token; the session middleware
/// clears the stored record when it sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExpired;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Submitted form failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] FormErrors),

    /// The API no longer accepts the session's token.
    #[error("Session expired")]
    SessionExpired,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error means the session is over.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::Api(ApiError::Unauthorized))
    }

    const fn is_server_error(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Api(err) => match err {
                ApiError::Http(_) | ApiError::Parse(_) | ApiError::InvalidEndpoint(_) => true,
                ApiError::Rejected { status, .. } => *status >= 500,
                ApiError::Unauthorized | ApiError::NotFound(_) => false,
            },
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_session_expired() {
            tracing::info!("Session rejected by API, redirecting to login");
            let mut response = Redirect::to("/login").into_response();
            response.extensions_mut().insert(SessionExpired);
            return response;
        }

        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = match &self {
            Self::Api(ApiError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Api(ApiError::InvalidEndpoint(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::SessionExpired => StatusCode::UNAUTHORIZED,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) | Self::Api(ApiError::InvalidEndpoint(_)) => {
                "Internal server error".to_string()
            }
            Self::Api(ApiError::NotFound(_)) => "Not found".to_string(),
            Self::Api(err) => err
                .user_message()
                .map_or_else(|| "External service error".to_string(), str::to_string),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Set the Sentry user context for the signed-in dashboard user.
pub fn set_sentry_user(user_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Api(ApiError::NotFound(String::new()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Validation(FormErrors::new())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Api(ApiError::Rejected {
                status: 409,
                message: "Conflict".to_string(),
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_redirects_to_login_and_marks_response() {
        for err in [AppError::SessionExpired, AppError::Api(ApiError::Unauthorized)] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(response.headers()["location"], "/login");
            assert_eq!(
                response.extensions().get::<SessionExpired>(),
                Some(&SessionExpired)
            );
        }
    }
}
