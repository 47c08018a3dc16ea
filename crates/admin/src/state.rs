//! Application state shared across handlers.

use std::sync::Arc;

use tyhub_core::UserId;

use crate::api::{ApiClient, ApiError};
use crate::cache::{QueryCache, UserCaches};
use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    api: ApiClient,
    caches: UserCaches,
}

impl AppState {
    /// Build the state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be created.
    pub fn new(config: AdminConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        let caches = UserCaches::new(config.cache);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                caches,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// The query cache of `user`.
    #[must_use]
    pub fn cache_for(&self, user: &UserId) -> QueryCache {
        self.inner.caches.for_user(user)
    }

    #[must_use]
    pub fn caches(&self) -> &UserCaches {
        &self.inner.caches
    }
}
