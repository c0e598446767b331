//! Command implementations.

pub mod config;
pub mod payment;
pub mod resolve;

use atelier_core::CheckoutIdError;
use atelier_storefront::config::ConfigError;
use atelier_storefront::services::CheckoutError;
use atelier_storefront::state::StateError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Environment does not form a valid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Clients could not be built from the configuration.
    #[error("Startup error: {0}")]
    State(#[from] StateError),

    /// Input file could not be read.
    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },

    /// Input file is not a cart.
    #[error("Invalid cart file: {0}")]
    Json(#[from] serde_json::Error),

    /// `--country` is not an ISO 3166-1 alpha-2 code.
    #[error("Invalid country code: {0}")]
    InvalidCountry(String),

    /// Cart validation or catalog lookup failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Checkout ID argument is malformed.
    #[error("Invalid checkout id: {0}")]
    CheckoutId(#[from] CheckoutIdError),
}
