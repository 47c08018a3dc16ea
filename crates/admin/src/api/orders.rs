//! Order endpoints.

use reqwest::Method;
use tracing::instrument;

use tyhub_core::{OrderId, OrderStatus};

use super::client::Auth;
use super::types::{Order, OrdersResponse, StatusUpdateRequest};
use super::{ApiClient, ApiError};
use crate::models::SessionContext;

impl ApiClient {
    /// List every order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session))]
    pub async fn list_orders(&self, session: &SessionContext) -> Result<Vec<Order>, ApiError> {
        let request = self.authorized(Method::GET, &["orders"], session)?;
        let response: OrdersResponse = self.send_json(request, Auth::Bearer).await?;
        Ok(response.into_orders())
    }

    /// Get one order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist.
    #[instrument(skip(self, session), fields(order_id = %id))]
    pub async fn get_order(&self, session: &SessionContext, id: &OrderId) -> Result<Order, ApiError> {
        let request = self.authorized(Method::GET, &["orders", id.as_str()], session)?;
        self.send_json(request, Auth::Bearer).await
    }

    /// Set the status of an order. Returns the updated order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the API refuses the change.
    #[instrument(skip(self, session), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        session: &SessionContext,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let request = self
            .authorized(Method::PUT, &["orders", id.as_str(), "status"], session)?
            .json(&StatusUpdateRequest { status });
        self.send_json(request, Auth::Bearer).await
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session), fields(order_id = %id))]
    pub async fn delete_order(&self, session: &SessionContext, id: &OrderId) -> Result<(), ApiError> {
        let request = self.authorized(Method::DELETE, &["orders", id.as_str()], session)?;
        self.send_unit(request, Auth::Bearer).await
    }
}
