//! Session-related types for admin authentication.
//!
//! The API authenticates every request with a bearer token handed out at
//! sign-in. The token and the signed-in user are the only state kept in the
//! session.

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::api::SessionUser;

/// Bearer token issued by the API.
///
/// Serialized into the session store as plain text; never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// An empty or whitespace-only token is never sent.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn to_secret(&self) -> SecretString {
        SecretString::from(self.0.clone())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// The persisted authentication record.
///
/// Written on sign-in (replacing any previous record) and removed on
/// sign-out or when the API answers 401.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: SessionUser,
    pub access_token: AccessToken,
}

impl AuthSession {
    #[must_use]
    pub const fn new(user: SessionUser, access_token: AccessToken) -> Self {
        Self { user, access_token }
    }

    /// A record without a usable token counts as signed out.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_blank()
    }

    /// Build the context handed to API calls.
    #[must_use]
    pub fn context(&self) -> SessionContext {
        SessionContext {
            user: self.user.clone(),
            access_token: self.access_token.to_secret(),
        }
    }
}

/// Session passed explicitly to every authenticated API call.
#[derive(Clone)]
pub struct SessionContext {
    user: SessionUser,
    access_token: SecretString,
}

impl SessionContext {
    #[must_use]
    pub const fn new(user: SessionUser, access_token: SecretString) -> Self {
        Self { user, access_token }
    }

    /// The signed-in user.
    #[must_use]
    pub const fn user(&self) -> &SessionUser {
        &self.user
    }

    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access_token
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("user", &self.user.email)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// One-shot message shown on the next page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, FlashKind::Error)
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for the [`AuthSession`](super::AuthSession) record.
    pub const AUTH: &str = "auth";

    /// Key for the pending [`Flash`](super::Flash) message.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;
    use tyhub_core::UserId;

    use super::*;

    fn user() -> SessionUser {
        SessionUser {
            id: UserId::new("u1"),
            email: "admin@tyhub.com".to_string(),
            username: "admin".to_string(),
            role: "admin".to_string(),
            address: None,
            profile_picture: None,
        }
    }

    #[test]
    fn test_blank_token_is_invalid() {
        assert!(!AuthSession::new(user(), AccessToken::new("  ")).is_valid());
        assert!(AuthSession::new(user(), AccessToken::new("tok")).is_valid());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = AuthSession::new(user(), AccessToken::new("super-secret"));
        assert!(!format!("{session:?}").contains("super-secret"));
        assert!(!format!("{:?}", session.context()).contains("super-secret"));
    }

    #[test]
    fn test_context_exposes_token_to_client() {
        let context = AuthSession::new(user(), AccessToken::new("tok")).context();
        assert_eq!(context.access_token().expose_secret(), "tok");
        assert_eq!(context.user().username, "admin");
    }

    #[test]
    fn test_session_record_round_trips_through_store_format() {
        let session = AuthSession::new(user(), AccessToken::new("tok"));
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["access_token"], "tok");
        let back: AuthSession = serde_json::from_value(json).unwrap();
        assert_eq!(back.user, session.user);
    }
}
