//! Session middleware configuration for admin.
//!
//! Sessions live in memory: the only state they hold is the API's bearer
//! token, which is worthless after a restart anyway.

use tower_sessions::cookie::{SameSite, time::Duration};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "tyhub_admin_session";

/// Inactivity expiry for sessions created with "remember me".
const REMEMBER_ME_DAYS: i64 = 30;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &AdminConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            config.session_expiry_hours,
        )))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}

/// Expiry applied to a session when the user asked to be remembered.
#[must_use]
pub const fn remember_me_expiry() -> Expiry {
    Expiry::OnInactivity(Duration::days(REMEMBER_ME_DAYS))
}
