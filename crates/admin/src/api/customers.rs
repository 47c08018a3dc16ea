//! Customer endpoints.

use reqwest::Method;
use tracing::instrument;

use tyhub_core::CustomerId;

use super::client::Auth;
use super::types::{Customer, CustomerResponse, CustomersResponse};
use super::{ApiClient, ApiError};
use crate::models::SessionContext;

impl ApiClient {
    /// List every registered customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session))]
    pub async fn list_customers(&self, session: &SessionContext) -> Result<Vec<Customer>, ApiError> {
        let request = self.authorized(Method::GET, &["users"], session)?;
        let response: CustomersResponse = self.send_json(request, Auth::Bearer).await?;
        Ok(response.customers)
    }

    /// Get one customer with their embedded orders.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the customer does not exist.
    #[instrument(skip(self, session), fields(customer_id = %id))]
    pub async fn get_customer(
        &self,
        session: &SessionContext,
        id: &CustomerId,
    ) -> Result<Customer, ApiError> {
        let request = self.authorized(Method::GET, &["users", "customer", id.as_str()], session)?;
        let response: CustomerResponse = self.send_json(request, Auth::Bearer).await?;
        Ok(response.customer)
    }
}
