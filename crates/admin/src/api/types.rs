//! Wire types for the TyHub REST API.
//!
//! Field names follow the API's camelCase JSON; record identifiers arrive as
//! `_id`. Optional collections default to empty so that partially populated
//! documents still deserialize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tyhub_core::{CustomerId, OrderId, OrderStatus, ProductId, ProductType, UserId};

// =============================================================================
// Users
// =============================================================================

/// The signed-in dashboard user as returned by `POST /users/signin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

/// Credentials sent to `POST /users/signin`.
#[derive(Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful sign-in response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub user: SessionUser,
    pub access_token: String,
}

// =============================================================================
// Products
// =============================================================================

/// An uploaded asset (product image or digital file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub url: String,
    #[serde(default)]
    pub public_id: Option<String>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    /// Absent means stock is not tracked.
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub images: Vec<Asset>,
    #[serde(default)]
    pub file: Option<Asset>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

/// Response to product create and update.
#[derive(Debug, Deserialize)]
pub struct ProductMutationResponse {
    pub product: Product,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Orders
// =============================================================================

/// The customer an order belongs to, as embedded in the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Product summary embedded in an order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemProduct {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub product_type: ProductType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: OrderItemProduct,
    pub quantity: u32,
    /// Unit price at the time of purchase.
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: String,
    #[serde(default)]
    pub reference: Option<String>,
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub user: OrderUser,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_info: Option<PaymentInfo>,
    #[serde(default)]
    pub is_digital: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `GET /orders` answers either with an envelope or with a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OrdersResponse {
    Paged {
        data: Vec<Order>,
        #[serde(default)]
        total: Option<u64>,
    },
    Plain(Vec<Order>),
}

impl OrdersResponse {
    #[must_use]
    pub fn into_orders(self) -> Vec<Order> {
        match self {
            Self::Paged { data, .. } => data,
            Self::Plain(orders) => orders,
        }
    }
}

#[derive(Serialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

// =============================================================================
// Customers
// =============================================================================

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: CustomerId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
pub struct CustomersResponse {
    pub customers: Vec<Customer>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerResponse {
    pub customer: Customer,
}

// =============================================================================
// Errors
// =============================================================================

/// Error body the API sends with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
