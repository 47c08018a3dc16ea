//! TyHub Admin library.
//!
//! Server-rendered administration dashboard for the TyHub REST API:
//! product catalog management, order handling and customer lookup.
//!
//! The dashboard keeps no database of its own. Every page is rendered from
//! API responses, cached per session token in [`cache::QueryCache`]; the
//! only local state is the signed-in user and bearer token held in the
//! session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cache;
pub mod components;
pub mod config;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
