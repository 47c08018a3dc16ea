//! Order reads and mutations.
//!
//! Status changes are optimistic: the new status is visible in the cached
//! order immediately and rolled back if the API refuses it.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use tyhub_core::{OrderId, OrderStatus};

use crate::api::{ApiClient, ApiError, Order};
use crate::cache::optimistic::{self, OptimisticCommand};
use crate::cache::{QueryCache, QueryKey, QueryKind, Snapshot};
use crate::models::SessionContext;
use crate::state::AppState;

/// Order service.
pub struct OrderService<'a> {
    api: &'a ApiClient,
    cache: QueryCache,
    session: &'a SessionContext,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState, session: &'a SessionContext) -> Self {
        Self {
            api: state.api(),
            cache: state.cache_for(&session.user().id),
            session,
        }
    }

    /// Every order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn list(&self) -> Result<Arc<Vec<Order>>, ApiError> {
        self.cache
            .fetch(QueryKey::Orders, || self.api.list_orders(self.session))
            .await
    }

    /// One order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist.
    pub async fn get(&self, id: &OrderId) -> Result<Arc<Order>, ApiError> {
        self.cache
            .fetch(QueryKey::Order(id.clone()), || {
                self.api.get_order(self.session, id)
            })
            .await
    }

    /// Change an order's status optimistically.
    ///
    /// # Errors
    ///
    /// Returns the API error after the cached order has been restored.
    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, ApiError> {
        let command = UpdateOrderStatus {
            api: self.api,
            cache: &self.cache,
            session: self.session,
            order_id: id,
            status,
        };
        optimistic::execute(&command).await
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete(&self, id: &OrderId) -> Result<(), ApiError> {
        self.api.delete_order(self.session, id).await?;
        self.cache.remove(&QueryKey::Order(id.clone())).await;
        self.cache.invalidate(&QueryKey::Orders).await;
        self.cache.invalidate_prefix(QueryKind::Customer).await;
        info!("Order deleted");
        Ok(())
    }
}

/// Set an order's status, showing the new status before the API confirms it.
pub struct UpdateOrderStatus<'a> {
    api: &'a ApiClient,
    cache: &'a QueryCache,
    session: &'a SessionContext,
    order_id: OrderId,
    status: OrderStatus,
}

impl UpdateOrderStatus<'_> {
    fn key(&self) -> QueryKey {
        QueryKey::Order(self.order_id.clone())
    }
}

impl OptimisticCommand for UpdateOrderStatus<'_> {
    type Snapshot = Snapshot;
    type Output = Order;
    type Error = ApiError;

    async fn capture(&self) -> Snapshot {
        let key = self.key();
        self.cache.cancel(&key);
        self.cache.snapshot(&key).await
    }

    async fn apply(&self) {
        let status = self.status;
        self.cache
            .update::<Order, _>(self.key(), |order| order.status = status)
            .await;
    }

    #[instrument(skip(self), fields(order_id = %self.order_id, status = %self.status))]
    async fn commit(&self) -> Result<Order, ApiError> {
        self.api
            .update_order_status(self.session, &self.order_id, self.status)
            .await
    }

    async fn revert(&self, snapshot: Snapshot) {
        warn!(order_id = %self.order_id, status = %self.status, "Status update failed, restoring cached order");
        self.cache.restore(self.key(), snapshot).await;
    }

    async fn settle(&self, order: &Order) {
        info!(order_id = %order.id, status = %order.status, "Order status updated");
        self.cache.invalidate(&self.key()).await;
        self.cache.invalidate(&QueryKey::Orders).await;
        // Customer details embed their orders.
        self.cache.invalidate_prefix(QueryKind::Customer).await;
    }
}
