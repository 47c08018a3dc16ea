//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions, in-memory store)
//! 4. Session expiry (clears the session when the API rejected its token)
//!
//! Route handlers require authentication with the [`RequireAuth`] extractor.

pub mod auth;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAuth, clear_auth_session, current_auth_session,
    expire_session_on_unauthorized, set_auth_session, set_flash, take_flash,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer, remember_me_expiry};
