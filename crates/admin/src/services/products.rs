//! Catalog reads and product mutations.

use std::sync::Arc;

use tracing::{info, instrument};

use tyhub_core::ProductId;

use crate::api::{ApiClient, ApiError, Product};
use crate::cache::{QueryCache, QueryKey};
use crate::forms::ProductPayload;
use crate::models::SessionContext;
use crate::state::AppState;

/// Product service.
pub struct ProductService<'a> {
    api: &'a ApiClient,
    cache: QueryCache,
    session: &'a SessionContext,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState, session: &'a SessionContext) -> Self {
        Self {
            api: state.api(),
            cache: state.cache_for(&session.user().id),
            session,
        }
    }

    /// The whole catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn list(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        self.cache
            .fetch(QueryKey::Products, || self.api.list_products(self.session))
            .await
    }

    /// Look a product up in the catalog.
    ///
    /// The API has no single-product read, so this searches the list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no product has this id.
    pub async fn find(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.list()
            .await?
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("product {id}")))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the upload.
    #[instrument(skip(self, payload))]
    pub async fn create(&self, payload: ProductPayload) -> Result<Product, ApiError> {
        let product = self.api.create_product(self.session, payload).await?;
        self.cache.invalidate(&QueryKey::Products).await;
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the upload.
    #[instrument(skip(self, payload), fields(product_id = %id))]
    pub async fn update(&self, id: &ProductId, payload: ProductPayload) -> Result<Product, ApiError> {
        let product = self.api.update_product(self.session, id, payload).await?;
        self.cache.invalidate(&QueryKey::Products).await;
        info!("Product updated");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), ApiError> {
        self.api.delete_product(self.session, id).await?;
        self.cache.invalidate(&QueryKey::Products).await;
        info!("Product deleted");
        Ok(())
    }
}
