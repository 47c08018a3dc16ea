//! Business logic services for admin.
//!
//! Services combine the API client with the query cache: reads go through the
//! cache, and mutations invalidate whatever they make out of date.
//!
//! # Services
//!
//! - `auth` - Sign-in and sign-out against the API
//! - `customers` - Customer list and detail reads
//! - `orders` - Order reads, optimistic status updates and deletion
//! - `products` - Catalog reads and product create/update/delete

pub mod auth;
pub mod customers;
pub mod orders;
pub mod products;

pub use auth::AuthService;
pub use customers::CustomerService;
pub use orders::{OrderService, UpdateOrderStatus};
pub use products::ProductService;
