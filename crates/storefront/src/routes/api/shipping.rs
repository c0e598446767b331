//! Shipping rate API.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::instrument;

use crate::context::StoreContext;
use crate::error::Result;
use crate::shipping::{RateQuote, RateRequestBody};
use crate::state::AppState;

/// Quote shipping to the posted destination.
///
/// Provider failures never surface here; the fallback table answers instead.
///
/// # Errors
///
/// `400` for a malformed body or invalid destination.
#[instrument(skip(state, context, payload))]
pub async fn rates(
    State(state): State<AppState>,
    context: StoreContext,
    payload: std::result::Result<Json<RateRequestBody>, JsonRejection>,
) -> Result<Json<RateQuote>> {
    let Json(body) = payload?;
    let (query, item_count) = body.into_query()?;
    Ok(Json(
        state
            .shipping()
            .quote(&query, item_count, context.currency)
            .await,
    ))
}
