//! Customer reads.

use std::sync::Arc;

use tyhub_core::CustomerId;

use crate::api::{ApiClient, ApiError, Customer};
use crate::cache::{QueryCache, QueryKey};
use crate::models::SessionContext;
use crate::state::AppState;

/// Customer service.
pub struct CustomerService<'a> {
    api: &'a ApiClient,
    cache: QueryCache,
    session: &'a SessionContext,
}

impl<'a> CustomerService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState, session: &'a SessionContext) -> Self {
        Self {
            api: state.api(),
            cache: state.cache_for(&session.user().id),
            session,
        }
    }

    /// Every registered customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn list(&self) -> Result<Arc<Vec<Customer>>, ApiError> {
        self.cache
            .fetch(QueryKey::Customers, || self.api.list_customers(self.session))
            .await
    }

    /// One customer with their orders.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the customer does not exist.
    pub async fn get(&self, id: &CustomerId) -> Result<Arc<Customer>, ApiError> {
        self.cache
            .fetch(QueryKey::Customer(id.clone()), || {
                self.api.get_customer(self.session, id)
            })
            .await
    }
}
