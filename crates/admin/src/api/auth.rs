//! Sign-in and sign-out.

use reqwest::Method;
use secrecy::ExposeSecret;
use tracing::instrument;

use super::client::Auth;
use super::types::{SignInRequest, SignInResponse};
use super::{ApiClient, ApiError};
use crate::forms::LoginInput;
use crate::models::SessionContext;

impl ApiClient {
    /// Exchange credentials for a user record and access token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` carrying the server's message when the
    /// credentials are refused.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn sign_in(&self, input: &LoginInput) -> Result<SignInResponse, ApiError> {
        let body = SignInRequest {
            email: input.email.as_str(),
            password: input.password.expose_secret(),
        };
        let request = self.request(Method::POST, &["users", "signin"])?.json(&body);
        self.send_json(request, Auth::Credentials).await
    }

    /// Tell the API the session is over.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session))]
    pub async fn sign_out(&self, session: &SessionContext) -> Result<(), ApiError> {
        let request = self.authorized(Method::POST, &["users", "logout"], session)?;
        self.send_unit(request, Auth::Bearer).await
    }
}
