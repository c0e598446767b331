//! Cart resolution dry run.
//!
//! # Usage
//!
//! ```bash
//! atelier resolve cart.json
//! atelier resolve cart.json --country AE
//! ```
//!
//! The file holds either `{ "items": [...] }` (the `POST /api/checkout`
//! body) or a bare item array. Lines are resolved against the live catalog
//! exactly as the checkout endpoint would; no cart is created.

use std::path::Path;

use atelier_storefront::config::StorefrontConfig;
use atelier_storefront::context::{StoreContext, normalize_country};
use atelier_storefront::services::checkout::{CartLine, CheckoutItem, Resolution, parse_items};
use atelier_storefront::state::AppState;
use serde::Deserialize;

use super::CliError;

#[derive(Deserialize)]
#[serde(untagged)]
enum CartFile {
    Body { items: Vec<CheckoutItem> },
    Items(Vec<CheckoutItem>),
}

/// Parse and validate a cart file's contents.
///
/// # Errors
///
/// Returns `CliError::Json` for malformed JSON or `CliError::Checkout` for
/// invalid lines.
pub fn parse_cart(raw: &str) -> Result<Vec<CartLine>, CliError> {
    let items = match serde_json::from_str::<CartFile>(raw)? {
        CartFile::Body { items } | CartFile::Items(items) => items,
    };
    Ok(parse_items(items)?)
}

/// Resolve the cart in `path` against the live catalog.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the configuration
/// is invalid, or the catalog cannot be fetched.
pub async fn run(path: &Path, country: Option<&str>) -> Result<Resolution, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|e| CliError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let lines = parse_cart(&raw)?;

    let config = StorefrontConfig::from_env()?;
    let mut context = StoreContext::with_currency(config.default_currency);
    if let Some(country) = country {
        context.country =
            Some(normalize_country(country).ok_or_else(|| CliError::InvalidCountry(country.to_string()))?);
    }

    let state = AppState::new(config)?;
    tracing::info!(lines = lines.len(), "Resolving cart against the catalog");
    Ok(state.checkout().resolve(&lines, &context).await?)
}
