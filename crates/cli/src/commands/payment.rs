//! Payment lookups.
//!
//! # Usage
//!
//! ```bash
//! atelier payment status 8ac7a4a28f1b2c3d.uat01-vm-tx04
//! ```
//!
//! Runs the same verification as the result page and prints the outcome as
//! JSON. Exits with status 2 unless the payment succeeded.

use atelier_core::PaymentCheckoutId;
use atelier_storefront::config::StorefrontConfig;
use atelier_storefront::hyperpay::PaymentResult;
use atelier_storefront::state::AppState;

use super::CliError;

/// Verify a payment by checkout ID.
///
/// # Errors
///
/// Returns an error for a malformed ID or invalid configuration. Gateway
/// problems are reported inside the result, never as success.
pub async fn status(config: StorefrontConfig, id: &str) -> Result<PaymentResult, CliError> {
    let checkout_id = PaymentCheckoutId::parse(id)?;
    let state = AppState::new(config)?;
    Ok(state.payment().verify(&checkout_id).await)
}
