//! Customer route handlers.

use askama::Template;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::instrument;

use tyhub_core::CustomerId;

use crate::api::{Customer, Order};
use crate::components::{DataTableView, TableQuery, apply_table, data_table};
use crate::error::AppError;
use crate::filters::{self, format_date, format_money};
use crate::middleware::RequireAuth;
use crate::services::CustomerService;
use crate::state::AppState;

use super::{AdminUserView, detail_error, load_error, render};

/// Customer row for the customers table.
#[derive(Debug, Clone)]
pub struct CustomerRowView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub registered: String,
}

impl From<&Customer> for CustomerRowView {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id.to_string(),
            username: customer.username.clone(),
            email: customer.email.clone(),
            phone: non_blank(customer.phone.as_deref()),
            registered: format_date(&customer.created_at),
        }
    }
}

/// An order in the customer's history.
#[derive(Debug, Clone)]
pub struct CustomerOrderView {
    pub id: String,
    pub number: String,
    pub date: String,
    pub item_count: u32,
    pub total: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
}

impl From<&Order> for CustomerOrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            number: format!("ORD-{}", order.id.short().to_uppercase()),
            date: format_date(&order.created_at),
            item_count: order.items.iter().map(|item| item.quantity).sum(),
            total: format_money(order.total_amount),
            status_label: order.status.label(),
            status_class: order.status.badge_class(),
        }
    }
}

/// Customer profile for the detail page.
#[derive(Debug, Clone)]
pub struct CustomerDetailView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub registered: String,
    pub updated: String,
    pub order_count: usize,
    pub total_spent: String,
    pub orders: Vec<CustomerOrderView>,
}

impl From<&Customer> for CustomerDetailView {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id.to_string(),
            username: customer.username.clone(),
            email: customer.email.clone(),
            phone: non_blank(customer.phone.as_deref()),
            address: non_blank(customer.address.as_deref()),
            role: customer.role.clone(),
            registered: format_date(&customer.created_at),
            updated: format_date(&customer.updated_at),
            order_count: customer.orders.len(),
            total_spent: format_money(customer.orders.iter().map(|o| o.total_amount).sum()),
            orders: customer.orders.iter().map(CustomerOrderView::from).collect(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Customers list page template.
#[derive(Template)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub table: DataTableView,
    pub customers: Vec<CustomerRowView>,
    pub total: usize,
    pub error: Option<String>,
}

/// Customer detail page template.
#[derive(Template)]
#[template(path = "customers/show.html")]
pub struct CustomerShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub customer: CustomerDetailView,
}

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(index))
        .route("/customers/{id}", get(show))
}

/// Customers list page.
///
/// GET /customers
#[instrument(skip(auth, state))]
async fn index(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> Result<Response, AppError> {
    let (customers, total, error) = match CustomerService::new(&state, &auth).list().await {
        Ok(customers) => {
            let rows = apply_table(&customers, &query)
                .into_iter()
                .map(CustomerRowView::from)
                .collect();
            (rows, customers.len(), None)
        }
        Err(err) => (Vec::new(), 0, Some(load_error(err, "customers")?)),
    };

    let template = CustomersIndexTemplate {
        admin_user: AdminUserView::from(&auth),
        current_path: "/customers".to_string(),
        table: data_table::customers_table_config().view(&query),
        customers,
        total,
        error,
    };
    Ok(render(&template).into_response())
}

/// Customer detail page with order history.
///
/// GET /customers/{id}
#[instrument(skip(auth, state), fields(customer_id = %id))]
async fn show(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
) -> Result<Response, AppError> {
    match CustomerService::new(&state, &auth).get(&id).await {
        Ok(customer) => {
            let template = CustomerShowTemplate {
                admin_user: AdminUserView::from(&auth),
                current_path: "/customers".to_string(),
                customer: CustomerDetailView::from(customer.as_ref()),
            };
            Ok(render(&template).into_response())
        }
        Err(err) => detail_error(
            err,
            "customer",
            AdminUserView::from(&auth),
            ("/customers", "Back to customers"),
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tyhub_core::OrderStatus;

    use super::*;
    use crate::cache::tests::order;

    fn customer() -> Customer {
        let mut customer: Customer = serde_json::from_value(serde_json::json!({
            "_id": "c1",
            "username": "Ada Lovelace",
            "email": "ada@example.com",
            "phone": "   ",
            "address": "12 Analytical Way",
            "role": "customer",
            "createdAt": "2024-03-09T08:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        customer.orders = vec![
            order("665f1c2e9b1d8a0012ab34cd", OrderStatus::Delivered),
            order("665f1c2e9b1d8a0012ab99ef", OrderStatus::Pending),
        ];
        customer
    }

    #[test]
    fn test_detail_view_summarizes_orders() {
        let view = CustomerDetailView::from(&customer());
        assert_eq!(view.order_count, 2);
        assert_eq!(view.total_spent, "$84.00");
        assert_eq!(view.registered, "Mar 9, 2024");
        assert_eq!(view.phone, None);
        assert_eq!(view.address.as_deref(), Some("12 Analytical Way"));
    }

    #[test]
    fn test_order_number_is_uppercased_short_id() {
        let view = CustomerDetailView::from(&customer());
        let first = view.orders.first().unwrap();
        assert!(first.number.starts_with("ORD-"));
        assert_eq!(first.number, first.number.to_uppercase());
        assert_eq!(first.status_label, "Delivered");
    }
}
