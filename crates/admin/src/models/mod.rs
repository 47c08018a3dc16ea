//! Domain models for admin.

pub mod session;

pub use session::{AccessToken, AuthSession, Flash, FlashKind, SessionContext, keys as session_keys};
