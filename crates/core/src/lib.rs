//! TyHub Core - Shared types library.
//!
//! This crate provides the domain types shared by the TyHub components:
//! - `admin` - The administration dashboard (server-rendered, talks to the REST API)
//! - `integration-tests` - End-to-end tests against an in-process fake API
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for identifiers and emails, order statuses,
//!   product types and stock classification

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
