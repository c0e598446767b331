//! Atelier Core - Shared types library.
//!
//! This crate provides common types used across all Atelier components:
//! - `storefront` - Checkout, payment and shipping API server
//! - `cli` - Operator tooling for configuration checks and payment lookups
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Prices, currencies, emails, opaque upstream IDs and payment statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
