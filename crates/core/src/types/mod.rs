//! Core types for TyHub.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod product;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use product::{LOW_STOCK_THRESHOLD, ProductType, StockFilter, StockLevel};
pub use status::{OrderStatus, ParseStatusError};
