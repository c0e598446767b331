//! Payment result page.
//!
//! The gateway redirects the shopper to `/checkout/result?id=…&resourcePath=…`.
//! Only `id` is used: it is validated and the outcome is fetched from the
//! gateway server-side. The supplied `resourcePath` is never trusted.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::{PaymentCheckoutId, PaymentStatus};
use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::filters;
use crate::hyperpay::PaymentResult;
use crate::state::AppState;

/// Gateway redirect parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub resource_path: Option<String>,
}

/// Payment result page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/result.html")]
pub struct ResultTemplate {
    /// `success`, `pending`, `failed` or `error`; also the CSS modifier.
    pub status: &'static str,
    pub heading: &'static str,
    pub message: &'static str,
    /// Gateway description, shown for declined payments.
    pub detail: Option<String>,
    pub transaction_id: Option<String>,
    pub amount: Option<String>,
    pub shop_url: String,
}

impl ResultTemplate {
    fn new(result: &PaymentResult, shop_url: String) -> Self {
        let (heading, message) = match result.status {
            PaymentStatus::Success => (
                "Payment received",
                "Thank you. Your order is confirmed and a receipt is on its way.",
            ),
            PaymentStatus::Pending => (
                "Payment pending",
                "Your bank has not confirmed the payment yet. We will email you once it does.",
            ),
            PaymentStatus::Failed => (
                "Payment not completed",
                "Your card was not charged. You can return to the shop and try again.",
            ),
            PaymentStatus::Error => (
                "We could not confirm your payment",
                "Please contact us with the reference below before paying again.",
            ),
        };

        let amount = match (result.amount, result.currency) {
            (Some(amount), Some(currency)) => Some(format!("{:.2} {currency}", amount.round_dp(2))),
            _ => None,
        };

        Self {
            status: result.status.as_str(),
            heading,
            message,
            detail: (result.status == PaymentStatus::Failed)
                .then(|| result.description.clone())
                .flatten(),
            transaction_id: result.transaction_id.clone(),
            amount,
            shop_url,
        }
    }
}

/// Verify the payment named by the redirect and render its outcome.
///
/// A missing or malformed `id` renders the error page with `400`; every other
/// outcome renders with `200`.
#[instrument(skip(state, query))]
pub async fn result(
    State(state): State<AppState>,
    query: Result<Query<ResultQuery>, QueryRejection>,
) -> impl IntoResponse {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let shop_url = state.config().base_url.clone();

    if query.resource_path.is_some() {
        debug!("Ignoring client-supplied resourcePath");
    }

    let checkout_id = match PaymentCheckoutId::parse(query.id.as_deref().unwrap_or_default()) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "Payment result requested with invalid checkout id");
            let result = PaymentResult::error("invalid checkout id");
            return (StatusCode::BAD_REQUEST, ResultTemplate::new(&result, shop_url));
        }
    };

    let result = state.payment().verify(&checkout_id).await;
    (StatusCode::OK, ResultTemplate::new(&result, shop_url))
}
