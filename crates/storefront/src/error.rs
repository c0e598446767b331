//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Error bodies are JSON: `{ "error": "...", "fallback": bool, "retryable": bool }`.
//! `fallback` tells the storefront it may offer on-site card payment instead
//! of the hosted checkout.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::hyperpay::HyperPayError;
use crate::services::{CheckoutError, PaymentError};
use crate::shipping::ShippingError;
use crate::shopify::ShopifyError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Hosted checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Payment session could not be opened.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Shipping quote request was invalid.
    #[error("Shipping error: {0}")]
    Shipping(#[from] ShippingError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    fallback: bool,
    retryable: bool,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::InvalidLine { .. } => {
                    StatusCode::BAD_REQUEST
                }
                CheckoutError::NoMatchingProducts { .. }
                | CheckoutError::Shopify(ShopifyError::UserErrors(_)) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                CheckoutError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
                CheckoutError::Shopify(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Payment(err) => match err {
                PaymentError::Gateway(HyperPayError::NotConfigured) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                PaymentError::Gateway(
                    HyperPayError::Http(_)
                    | HyperPayError::Status { .. }
                    | HyperPayError::MalformedResponse(_),
                ) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Shipping(ShippingError::InvalidInput(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Shipping(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Whether the storefront may switch to on-site card payment.
    #[must_use]
    pub const fn offers_fallback(&self) -> bool {
        matches!(
            self,
            Self::Checkout(
                CheckoutError::NoMatchingProducts { .. }
                    | CheckoutError::NotConfigured
                    | CheckoutError::Shopify(_)
            )
        )
    }

    /// Whether repeating the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Checkout(err) => err.is_retryable(),
            Self::Payment(err) => err.is_retryable(),
            Self::Shipping(err) => !matches!(err, ShippingError::InvalidInput(_)),
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    /// Message safe to show a shopper. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::InvalidLine { .. } => err.to_string(),
                CheckoutError::NoMatchingProducts { .. } => {
                    "Product list does not match catalog".to_string()
                }
                CheckoutError::NotConfigured => "Checkout is temporarily unavailable".to_string(),
                CheckoutError::Shopify(ShopifyError::UserErrors(_)) => {
                    "Some items could not be added to the cart".to_string()
                }
                CheckoutError::Shopify(_) => {
                    "Checkout service is unavailable, please try again".to_string()
                }
            },
            Self::Payment(err) => match err {
                PaymentError::Gateway(HyperPayError::NotConfigured) => {
                    "Card payment is temporarily unavailable".to_string()
                }
                PaymentError::Gateway(HyperPayError::Rejected { description, .. }) => {
                    description.clone()
                }
                PaymentError::Gateway(_) => {
                    "Payment service is unavailable, please try again".to_string()
                }
                _ => err.to_string(),
            },
            Self::Shipping(ShippingError::InvalidInput(reason)) => (*reason).to_string(),
            Self::Shipping(_) => "Shipping service is unavailable".to_string(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let body = ErrorBody {
            error: self.public_message(),
            fallback: self.offers_fallback(),
            retryable: self.is_retryable(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Cart submitted", Some(&[("lines", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;
    use crate::shopify::CartUserError;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("linen-abaya".to_string());
        assert_eq!(err.to_string(), "Not found: linen-abaya");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_checkout_status_codes() {
        assert_eq!(
            AppError::from(CheckoutError::EmptyCart).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CheckoutError::NoMatchingProducts { unmatched: vec![] }).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(CheckoutError::Shopify(ShopifyError::UserErrors(vec![
                CartUserError {
                    field: None,
                    message: "invalid".to_string(),
                    code: None,
                }
            ])))
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(CheckoutError::NotConfigured).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(CheckoutError::Shopify(ShopifyError::RateLimited(1))).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_payment_status_codes() {
        let gateway = |e| AppError::Payment(PaymentError::Gateway(e));
        assert_eq!(
            gateway(HyperPayError::NotConfigured).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            gateway(HyperPayError::Rejected {
                code: "200.300.404".to_string(),
                description: "invalid or missing parameter".to_string()
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            gateway(HyperPayError::Status {
                status: 503,
                message: String::new()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_body_hides_internal_details() {
        let (status, body) = body_json(AppError::Checkout(CheckoutError::Shopify(
            ShopifyError::Status {
                status: 503,
                message: "secret upstream stack trace".to_string(),
            },
        )))
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body["error"],
            "Checkout service is unavailable, please try again"
        );
        assert_eq!(body["fallback"], true);
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn test_bad_input_offers_no_fallback() {
        let (status, body) = body_json(AppError::Checkout(CheckoutError::EmptyCart)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "cart is empty");
        assert_eq!(body["fallback"], false);
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn test_gateway_rejection_surfaces_description() {
        let (_, body) = body_json(AppError::Payment(PaymentError::Gateway(
            HyperPayError::Rejected {
                code: "200.300.404".to_string(),
                description: "invalid or missing parameter".to_string(),
            },
        )))
        .await;
        assert_eq!(body["error"], "invalid or missing parameter");
    }
}
