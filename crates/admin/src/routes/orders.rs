//! Order route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use tyhub_core::{OrderId, OrderStatus};

use crate::api::{Order, OrderItem};
use crate::components::{DataTableView, TableQuery, apply_table, data_table};
use crate::error::AppError;
use crate::filters::{self, format_date, format_datetime, format_money};
use crate::middleware::{RequireAuth, set_flash, take_flash};
use crate::models::Flash;
use crate::services::OrderService;
use crate::state::AppState;

use super::{AdminUserView, SelectOption, detail_error, load_error, mutation_error, render};

/// Order row for the orders table.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: String,
    pub short_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub date: String,
    pub total: String,
    pub item_count: u32,
    pub status_label: &'static str,
    pub status_class: &'static str,
}

impl From<&Order> for OrderRowView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            short_id: format!("#{}", order.id.short()),
            customer_name: customer_name(order),
            customer_email: order.user.email.clone().unwrap_or_default(),
            date: format_date(&order.created_at),
            total: format_money(order.total_amount),
            item_count: order.items.iter().map(|item| item.quantity).sum(),
            status_label: order.status.label(),
            status_class: order.status.badge_class(),
        }
    }
}

/// Line item on the order detail page.
#[derive(Debug, Clone)]
pub struct LineItemView {
    pub title: String,
    pub type_label: &'static str,
    pub quantity: u32,
    pub unit_price: String,
    pub subtotal: String,
}

impl From<&OrderItem> for LineItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            title: item.product.title.clone(),
            type_label: item.product.product_type.label(),
            quantity: item.quantity,
            unit_price: format_money(item.price),
            subtotal: format_money(item.price * f64::from(item.quantity)),
        }
    }
}

/// Order detail for the detail page.
#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub id: String,
    pub short_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub total: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub is_digital: bool,
    pub items: Vec<LineItemView>,
}

impl From<&Order> for OrderDetailView {
    fn from(order: &Order) -> Self {
        let payment = order.payment_info.as_ref();
        Self {
            id: order.id.to_string(),
            short_id: format!("#{}", order.id.short()),
            customer_id: order.user.id.to_string(),
            customer_name: customer_name(order),
            customer_email: order.user.email.clone(),
            created_at: format_datetime(&order.created_at),
            updated_at: format_datetime(&order.updated_at),
            total: format_money(order.total_amount),
            status: order.status,
            status_label: order.status.label(),
            status_class: order.status.badge_class(),
            payment_method: payment.map(|p| p.method.clone()),
            payment_reference: payment.and_then(|p| p.reference.clone()),
            is_digital: order.is_digital.unwrap_or(false),
            items: order.items.iter().map(LineItemView::from).collect(),
        }
    }
}

fn customer_name(order: &Order) -> String {
    if order.user.name.trim().is_empty() {
        "Unknown customer".to_string()
    } else {
        order.user.name.clone()
    }
}

/// Every status, with `current` selected.
fn status_options(current: OrderStatus) -> Vec<SelectOption> {
    OrderStatus::ALL
        .iter()
        .map(|s| SelectOption {
            value: s.as_str(),
            label: s.label(),
            selected: *s == current,
        })
        .collect()
}

/// Orders list page template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub table: DataTableView,
    pub orders: Vec<OrderRowView>,
    pub total: usize,
    pub error: Option<String>,
    pub flash: Option<Flash>,
}

/// Order detail page template.
#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub order: OrderDetailView,
    pub status_options: Vec<SelectOption>,
    pub flash: Option<Flash>,
}

/// Submitted status selector.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/status", post(update_status))
        .route("/orders/{id}/delete", post(delete))
}

/// Orders list page.
///
/// GET /orders
#[instrument(skip(auth, state, session))]
async fn index(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<TableQuery>,
) -> Result<Response, AppError> {
    let (orders, total, error) = match OrderService::new(&state, &auth).list().await {
        Ok(orders) => {
            let rows = apply_table(&orders, &query)
                .into_iter()
                .map(OrderRowView::from)
                .collect();
            (rows, orders.len(), None)
        }
        Err(err) => (Vec::new(), 0, Some(load_error(err, "orders")?)),
    };

    let template = OrdersIndexTemplate {
        admin_user: AdminUserView::from(&auth),
        current_path: "/orders".to_string(),
        table: data_table::orders_table_config().view(&query),
        orders,
        total,
        error,
        flash: take_flash(&session).await,
    };
    Ok(render(&template).into_response())
}

/// Order detail page.
///
/// Shows the cached order, which reflects a pending status change
/// until the API has answered.
///
/// GET /orders/{id}
#[instrument(skip(auth, state, session), fields(order_id = %id))]
async fn show(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<Response, AppError> {
    let order = match OrderService::new(&state, &auth).get(&id).await {
        Ok(order) => order,
        Err(err) => {
            return detail_error(
                err,
                "order",
                AdminUserView::from(&auth),
                ("/orders", "Back to orders"),
            );
        }
    };

    let template = OrderShowTemplate {
        admin_user: AdminUserView::from(&auth),
        current_path: "/orders".to_string(),
        status_options: status_options(order.status),
        order: OrderDetailView::from(order.as_ref()),
        flash: take_flash(&session).await,
    };
    Ok(render(&template).into_response())
}

/// Change an order's status.
///
/// POST /orders/{id}/status
#[instrument(skip(auth, state, session, form), fields(order_id = %id))]
async fn update_status(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AppError> {
    let status: OrderStatus = form
        .status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown order status: {}", form.status)))?;

    let back = format!("/orders/{id}");
    let flash = match OrderService::new(&state, &auth)
        .update_status(id, status)
        .await
    {
        Ok(order) => Flash::success(format!("Order status updated to {}", order.status.label())),
        Err(err) => Flash::error(mutation_error(err, "Failed to update order status")?),
    };
    set_flash(&session, flash).await;

    Ok(Redirect::to(&back))
}

/// Delete an order.
///
/// POST /orders/{id}/delete
#[instrument(skip(auth, state, session), fields(order_id = %id))]
async fn delete(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<Redirect, AppError> {
    match OrderService::new(&state, &auth).delete(&id).await {
        Ok(()) => {
            set_flash(&session, Flash::success("Order deleted")).await;
            Ok(Redirect::to("/orders"))
        }
        Err(err) => {
            let message = mutation_error(err, "Failed to delete order")?;
            set_flash(&session, Flash::error(message)).await;
            Ok(Redirect::to(&format!("/orders/{id}")))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::tests::order;

    #[test]
    fn test_row_view() {
        let order = order("665f1c2e9b1d8a0012ab34cd", OrderStatus::Shipped);
        let row = OrderRowView::from(&order);
        let short = row.short_id.strip_prefix('#').unwrap();
        assert!(order.id.as_str().ends_with(short));
        assert_eq!(row.customer_name, "Ada Lovelace");
        assert_eq!(row.total, "$42.00");
        assert_eq!(row.status_label, "Shipped");
        assert_eq!(row.status_class, OrderStatus::Shipped.badge_class());
    }

    #[test]
    fn test_line_item_subtotal() {
        let item: OrderItem = serde_json::from_value(serde_json::json!({
            "product": { "_id": "p1", "title": "Poster", "price": 12.5, "type": "physical" },
            "quantity": 3,
            "price": 12.5
        }))
        .unwrap();
        let view = LineItemView::from(&item);
        assert_eq!(view.unit_price, "$12.50");
        assert_eq!(view.subtotal, "$37.50");
        assert_eq!(view.type_label, "Physical");
    }

    #[test]
    fn test_missing_customer_name() {
        let mut order = order("o1", OrderStatus::Pending);
        order.user.name = String::new();
        assert_eq!(OrderDetailView::from(&order).customer_name, "Unknown customer");
    }

    #[test]
    fn test_status_options_select_current() {
        let options = status_options(OrderStatus::Delivered);
        assert_eq!(options.len(), OrderStatus::ALL.len());
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.first().unwrap().value, "delivered");
    }
}
