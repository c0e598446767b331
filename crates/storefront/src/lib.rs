//! Atelier Storefront library.
//!
//! Checkout, payment and shipping API for the storefront SPA, exposed as a
//! library so the binary, the operator CLI and the integration tests share
//! one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod context;
pub mod error;
mod filters;
pub mod hyperpay;
pub mod image_manifest;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shipping;
pub mod shopify;
pub mod state;
