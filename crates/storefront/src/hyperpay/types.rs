//! Payment request and result types.

use atelier_core::{CurrencyCode, Email, PaymentCheckoutId, PaymentStatus, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything needed to open a checkout session.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Total to charge, shipping included.
    pub price: Price,
    pub customer: Customer,
    pub billing: Option<Address>,
    pub shipping: Option<Address>,
    /// Shown on the gateway side only; not re-priced here.
    pub items: Vec<PaymentItem>,
    pub shipping_method: Option<ShippingMethod>,
}

/// Shopper contact details. Only the email is required.
#[derive(Debug, Clone)]
pub struct Customer {
    pub email: Email,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub mobile: Option<String>,
}

/// Postal address, every field best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    /// ISO 3166-1 alpha-2.
    pub country: Option<String>,
    pub postcode: Option<String>,
}

impl Address {
    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.country.is_none()
            && self.postcode.is_none()
    }
}

/// Line item for gateway-side display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Shipping method chosen at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingMethod {
    pub name: String,
    pub cost: Decimal,
}

/// An opened checkout session for the payment widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub checkout_id: PaymentCheckoutId,
    /// Origin the widget script is loaded from.
    pub base_url: String,
}

impl PaymentSession {
    /// URL of the payment widget script for this session.
    #[must_use]
    pub fn widget_url(&self) -> String {
        format!(
            "{}/v1/paymentWidgets.js?checkoutId={}",
            self.base_url, self.checkout_id
        )
    }
}

/// Verified outcome of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PaymentResult {
    /// An `error` result: the outcome could not be determined.
    #[must_use]
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            status: PaymentStatus::Error,
            transaction_id: None,
            amount: None,
            currency: None,
            result_code: None,
            description: Some(description.into()),
        }
    }
}

// =============================================================================
// Gateway responses
// =============================================================================

/// `result` object present on every gateway response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultInfo {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

/// `POST /v1/checkouts` response.
#[derive(Debug, Deserialize)]
pub struct CheckoutResponse {
    pub result: Option<ResultInfo>,
    pub id: Option<String>,
}

/// `GET /v1/checkouts/{id}/payment` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub result: Option<ResultInfo>,
    pub id: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub merchant_transaction_id: Option<String>,
}
