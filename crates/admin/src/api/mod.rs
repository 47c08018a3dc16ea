//! Client for the TyHub REST API.
//!
//! # Architecture
//!
//! - The remote API is the source of truth; the dashboard only renders it
//! - Every authenticated call takes an explicit [`SessionContext`] and sends
//!   its token as `Authorization: Bearer <token>`
//! - A 401 from any endpoint surfaces as [`ApiError::Unauthorized`], which the
//!   request layer turns into a session expiry
//!
//! [`SessionContext`]: crate::models::SessionContext

mod auth;
mod client;
mod customers;
mod orders;
mod products;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The bearer token was missing, expired or revoked.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API answered with a non-success status.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// An endpoint path could not be built on the base URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl ApiError {
    /// Message suitable for showing to the dashboard user.
    ///
    /// Server-supplied messages are passed through; transport details are not.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}
