//! Hosted checkout API.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::context::StoreContext;
use crate::error::{Result, add_breadcrumb};
use crate::services::checkout::{CheckoutItem, parse_items};
use crate::state::AppState;

/// `POST /api/checkout` body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
}

/// Where to send the shopper.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

/// Resolve the posted cart against the catalog and open a hosted checkout.
///
/// # Errors
///
/// `400` for a malformed body or invalid lines, `422` when nothing matches
/// the catalog, `500` without Shopify credentials, `502` on upstream failure.
/// Errors past validation set `fallback` so the client can offer card
/// payment instead.
#[instrument(skip(state, context, payload))]
pub async fn create(
    State(state): State<AppState>,
    context: StoreContext,
    payload: std::result::Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>> {
    let Json(request) = payload?;
    let lines = parse_items(request.items)?;

    let line_count = lines.len().to_string();
    add_breadcrumb(
        "checkout",
        "Cart submitted",
        Some(&[("lines", line_count.as_str()), ("currency", context.currency.code())]),
    );

    let session = state.checkout().create_checkout(&lines, &context).await?;

    Ok(Json(CheckoutResponse {
        checkout_url: session.redirect_url,
    }))
}
