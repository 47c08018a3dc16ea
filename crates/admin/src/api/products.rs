//! Product endpoints. Create and update upload `multipart/form-data`.

use reqwest::Method;
use tracing::instrument;

use tyhub_core::ProductId;

use super::client::Auth;
use super::types::{Product, ProductMutationResponse, ProductsResponse};
use super::{ApiClient, ApiError};
use crate::forms::ProductPayload;
use crate::models::SessionContext;

impl ApiClient {
    /// List the whole catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session))]
    pub async fn list_products(&self, session: &SessionContext) -> Result<Vec<Product>, ApiError> {
        let request = self.authorized(Method::GET, &["products"], session)?;
        let response: ProductsResponse = self.send_json(request, Auth::Bearer).await?;
        Ok(response.products)
    }

    /// Create a product from a validated payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload is refused or fails.
    #[instrument(skip(self, session, payload), fields(title = %payload.title))]
    pub async fn create_product(
        &self,
        session: &SessionContext,
        payload: ProductPayload,
    ) -> Result<Product, ApiError> {
        let request = self
            .authorized(Method::POST, &["products", "create"], session)?
            .multipart(payload.into_multipart()?);
        let response: ProductMutationResponse = self.send_json(request, Auth::Bearer).await?;
        Ok(response.product)
    }

    /// Replace a product's fields (and optionally its media).
    ///
    /// # Errors
    ///
    /// Returns an error if the upload is refused or fails.
    #[instrument(skip(self, session, payload), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        session: &SessionContext,
        id: &ProductId,
        payload: ProductPayload,
    ) -> Result<Product, ApiError> {
        let request = self
            .authorized(Method::PUT, &["products", id.as_str()], session)?
            .multipart(payload.into_multipart()?);
        let response: ProductMutationResponse = self.send_json(request, Auth::Bearer).await?;
        Ok(response.product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session), fields(product_id = %id))]
    pub async fn delete_product(&self, session: &SessionContext, id: &ProductId) -> Result<(), ApiError> {
        let request = self.authorized(Method::DELETE, &["products", id.as_str()], session)?;
        self.send_unit(request, Auth::Bearer).await
    }
}
