//! Authentication service.
//!
//! Credentials are checked by the API; the dashboard keeps only the
//! returned user record and bearer token.

use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ApiError};
use crate::cache::UserCaches;
use crate::forms::LoginInput;
use crate::models::{AccessToken, AuthSession, SessionContext};
use crate::state::AppState;

/// Authentication service.
pub struct AuthService<'a> {
    api: &'a ApiClient,
    caches: &'a UserCaches,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            api: state.api(),
            caches: state.caches(),
        }
    }

    /// Sign in with validated credentials.
    ///
    /// The returned record may carry a blank token, in which case the caller
    /// must treat the sign-in as failed.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the server's message when the
    /// credentials are refused.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn sign_in(&self, input: &LoginInput) -> Result<AuthSession, ApiError> {
        let response = self.api.sign_in(input).await?;
        info!(user_id = %response.user.id, "Signed in");
        Ok(AuthSession::new(
            response.user,
            AccessToken::new(response.access_token),
        ))
    }

    /// Sign out and forget the user's cached data.
    ///
    /// The API call is best effort: the local session ends regardless.
    #[instrument(skip(self, session), fields(user_id = %session.user().id))]
    pub async fn sign_out(&self, session: &SessionContext) {
        if let Err(e) = self.api.sign_out(session).await {
            warn!(error = %e, "API sign-out failed, ending local session anyway");
        }
        self.caches.evict(&session.user().id);
    }
}
