//! Card payment API backed by the `HyperPay` widget.

use atelier_core::PaymentCheckoutId;
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::Deserialize;
use tracing::instrument;

use crate::context::StoreContext;
use crate::error::{Result, add_breadcrumb};
use crate::hyperpay::{PaymentResult, PaymentSession};
use crate::services::PaymentError;
use crate::services::payment::PaymentRequestBody;
use crate::state::AppState;

/// Open a payment session; the client loads the widget from
/// `{baseUrl}/v1/paymentWidgets.js?checkoutId={checkoutId}`.
///
/// # Errors
///
/// `400` for validation failures or a gateway rejection, `500` when the
/// gateway is not configured, `502` on transport failure.
#[instrument(skip(state, context, payload))]
pub async fn create(
    State(state): State<AppState>,
    context: StoreContext,
    payload: std::result::Result<Json<PaymentRequestBody>, JsonRejection>,
) -> Result<Json<PaymentSession>> {
    let Json(body) = payload?;

    let item_count = body.items.len().to_string();
    add_breadcrumb(
        "payment",
        "Payment session requested",
        Some(&[("items", item_count.as_str())]),
    );

    let session = state.payment().initiate(body, &context).await?;
    Ok(Json(session))
}

/// `GET /api/hyperpay/status` query.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub id: String,
}

/// Verify a payment by checkout ID.
///
/// Any verdict the gateway cannot confirm comes back as `failed` or `error`,
/// never `success`.
///
/// # Errors
///
/// `400` if the ID is missing or malformed.
#[instrument(skip(state, query))]
pub async fn status(
    State(state): State<AppState>,
    query: std::result::Result<Query<StatusQuery>, QueryRejection>,
) -> Result<Json<PaymentResult>> {
    let Query(query) = query?;
    let checkout_id = PaymentCheckoutId::parse(&query.id).map_err(PaymentError::from)?;

    Ok(Json(state.payment().verify(&checkout_id).await))
}
