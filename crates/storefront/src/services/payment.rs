//! On-site card payments through `HyperPay`.
//!
//! Opens gateway sessions from validated shopper input and verifies payment
//! outcomes against the gateway. Verification never reports success on its
//! own: anything short of a classified gateway answer is an `error` result.

use atelier_core::{
    CheckoutIdError, CurrencyCode, Email, EmailError, PaymentCheckoutId, Price, PriceError,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::context::{StoreContext, normalize_country};
use crate::hyperpay::{
    Address, Customer, HyperPayClient, HyperPayError, PaymentItem, PaymentRequest, PaymentResult,
    PaymentSession, ShippingMethod,
};

/// Errors from opening a payment session.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("invalid amount: {0}")]
    InvalidAmount(PriceError),

    #[error("unsupported currency: {0}")]
    InvalidCurrency(PriceError),

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("invalid item {index}: {reason}")]
    InvalidItem { index: usize, reason: &'static str },

    #[error("invalid checkout id: {0}")]
    InvalidCheckoutId(#[from] CheckoutIdError),

    #[error(transparent)]
    Gateway(#[from] HyperPayError),
}

impl PaymentError {
    /// Whether the shopper can reasonably try the same request again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Gateway(e) => e.is_transport(),
            _ => false,
        }
    }
}

// =============================================================================
// Request body
// =============================================================================

/// `POST /api/hyperpay` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentRequestBody {
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    pub customer: CustomerBody,
    #[serde(default)]
    pub items: Vec<PaymentItemBody>,
    #[serde(default)]
    pub shipping: Option<ShippingBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBody {
    pub email: String,
    #[serde(default, alias = "givenName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "surname")]
    pub last_name: Option<String>,
    #[serde(default, alias = "mobile")]
    pub phone: Option<String>,
    #[serde(default, alias = "street")]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, alias = "postalCode", alias = "zip")]
    pub postcode: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentItemBody {
    #[serde(alias = "nameEn")]
    pub name: String,
    pub quantity: i64,
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingBody {
    #[serde(alias = "name")]
    pub method: String,
    #[serde(default)]
    pub cost: Decimal,
}

impl PaymentRequestBody {
    /// Validate into a gateway request. The currency defaults to the store
    /// context's currency.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn into_request(self, context: &StoreContext) -> Result<PaymentRequest, PaymentError> {
        let currency = match self.currency.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code
                .parse::<CurrencyCode>()
                .map_err(PaymentError::InvalidCurrency)?,
            _ => context.currency,
        };
        let price = Price::new(self.amount, currency).map_err(PaymentError::InvalidAmount)?;

        let c = self.customer;
        let customer = Customer {
            email: Email::parse(&c.email)?,
            given_name: non_blank(c.first_name),
            surname: non_blank(c.last_name),
            mobile: non_blank(c.phone),
        };
        let address = Address {
            street: non_blank(c.address),
            city: non_blank(c.city),
            state: non_blank(c.state),
            country: c.country.as_deref().and_then(normalize_country),
            postcode: non_blank(c.postcode),
        };
        let address = (!address.is_empty()).then_some(address);

        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let quantity = u32::try_from(item.quantity)
                    .ok()
                    .filter(|q| *q >= 1)
                    .ok_or(PaymentError::InvalidItem {
                        index,
                        reason: "quantity must be a positive integer",
                    })?;
                if item.price.is_sign_negative() {
                    return Err(PaymentError::InvalidItem {
                        index,
                        reason: "price must not be negative",
                    });
                }
                Ok(PaymentItem {
                    name: item.name.trim().to_string(),
                    quantity,
                    unit_price: item.price,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let shipping_method = self
            .shipping
            .filter(|s| !s.method.trim().is_empty())
            .map(|s| ShippingMethod {
                name: s.method.trim().to_string(),
                cost: s.cost.max(Decimal::ZERO),
            });

        Ok(PaymentRequest {
            price,
            customer,
            billing: address.clone(),
            shipping: address,
            items,
            shipping_method,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Service
// =============================================================================

/// Opens and verifies `HyperPay` payments.
#[derive(Clone)]
pub struct PaymentService {
    hyperpay: Option<HyperPayClient>,
    result_url: String,
}

impl PaymentService {
    /// `result_url` is where the gateway sends the shopper back to.
    #[must_use]
    pub const fn new(hyperpay: Option<HyperPayClient>, result_url: String) -> Self {
        Self {
            hyperpay,
            result_url,
        }
    }

    /// Whether gateway credentials are configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.hyperpay.is_some()
    }

    /// Open a checkout session for the payment widget.
    ///
    /// Fails with `HyperPayError::NotConfigured` before any validation or
    /// network call when the gateway is not configured.
    ///
    /// # Errors
    ///
    /// Returns a validation error or the gateway error.
    #[instrument(skip(self, body, context))]
    pub async fn initiate(
        &self,
        body: PaymentRequestBody,
        context: &StoreContext,
    ) -> Result<PaymentSession, PaymentError> {
        let Some(client) = &self.hyperpay else {
            tracing::error!(
                "HyperPay is not configured; set HYPERPAY_ACCESS_TOKEN and HYPERPAY_ENTITY_ID"
            );
            return Err(HyperPayError::NotConfigured.into());
        };

        let request = body.into_request(context)?;
        let session = client.create_checkout(&request, &self.result_url).await?;

        info!(
            checkout_id = %session.checkout_id,
            amount = %request.price,
            "Payment session created"
        );
        Ok(session)
    }

    /// Ask the gateway for the outcome of a checkout.
    ///
    /// Never fails: configuration and transport problems yield an `error`
    /// result, unknown codes a `failed` one.
    #[instrument(skip(self), fields(checkout_id = %checkout_id))]
    pub async fn verify(&self, checkout_id: &PaymentCheckoutId) -> PaymentResult {
        let Some(client) = &self.hyperpay else {
            tracing::error!("Cannot verify payment: HyperPay is not configured");
            return PaymentResult::error("Payment gateway is not configured");
        };

        match client.payment_status(checkout_id).await {
            Ok(result) => {
                info!(
                    status = %result.status,
                    code = result.result_code.as_deref().unwrap_or_default(),
                    "Payment verified"
                );
                result
            }
            Err(e) => {
                warn!(error = %e, "Payment verification failed");
                PaymentResult::error("Payment status could not be verified")
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use atelier_core::PaymentStatus;
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers::any};

    use super::*;
    use crate::config::HyperPayConfig;

    fn body(value: serde_json::Value) -> PaymentRequestBody {
        serde_json::from_value(value).unwrap()
    }

    fn valid_body() -> PaymentRequestBody {
        body(json!({
            "amount": "374.00",
            "customer": {
                "email": "noura@example.sa",
                "firstName": "Noura",
                "lastName": " ",
                "city": "Riyadh",
                "country": "sa"
            },
            "items": [{ "nameEn": "Linen Abaya", "quantity": 1, "price": 349 }],
            "shipping": { "method": "Aramex", "cost": "25" }
        }))
    }

    fn ctx() -> StoreContext {
        StoreContext::with_currency(CurrencyCode::SAR)
    }

    #[test]
    fn test_into_request_defaults_currency_from_context() {
        let request = valid_body()
            .into_request(&StoreContext::with_currency(CurrencyCode::AED))
            .unwrap();

        assert_eq!(request.price.currency_code(), CurrencyCode::AED);
        assert_eq!(request.price.gateway_amount(), "374.00");
        assert_eq!(request.customer.given_name.as_deref(), Some("Noura"));
        assert_eq!(request.customer.surname, None);
        let shipping = request.shipping.unwrap();
        assert_eq!(shipping.country.as_deref(), Some("SA"));
        assert_eq!(shipping.city.as_deref(), Some("Riyadh"));
        assert_eq!(request.items[0].unit_price, Decimal::new(349, 0));
        assert_eq!(request.shipping_method.unwrap().name, "Aramex");
    }

    #[test]
    fn test_into_request_validation() {
        let mut b = valid_body();
        b.amount = Decimal::ZERO;
        assert!(matches!(
            b.into_request(&ctx()),
            Err(PaymentError::InvalidAmount(_))
        ));

        let mut b = valid_body();
        b.amount = Decimal::new(1001, 3);
        assert!(matches!(
            b.into_request(&ctx()),
            Err(PaymentError::InvalidAmount(_))
        ));

        let mut b = valid_body();
        b.currency = Some("BTC".to_string());
        assert!(matches!(
            b.into_request(&ctx()),
            Err(PaymentError::InvalidCurrency(_))
        ));

        let mut b = valid_body();
        b.customer.email = "not-an-email".to_string();
        assert!(matches!(
            b.into_request(&ctx()),
            Err(PaymentError::InvalidEmail(_))
        ));

        let mut b = valid_body();
        b.items[0].quantity = 0;
        assert!(matches!(
            b.into_request(&ctx()),
            Err(PaymentError::InvalidItem { index: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_credentials_makes_no_outbound_call() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let service = PaymentService::new(None, format!("{}/checkout/result", server.uri()));
        let err = service.initiate(valid_body(), &ctx()).await.unwrap_err();

        assert!(matches!(
            err,
            PaymentError::Gateway(HyperPayError::NotConfigured)
        ));
        assert!(!err.is_retryable());

        let id = PaymentCheckoutId::parse("ABC123").unwrap();
        assert_eq!(service.verify(&id).await.status, PaymentStatus::Error);
    }

    #[tokio::test]
    async fn test_verify_transport_failure_is_error_not_success() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let config = HyperPayConfig {
            base_url: server.uri(),
            access_token: SecretString::from("OGE4Mjk0MTc0YjdlY2IyODAxNGI5Njk5MjIwMDE1Y2N8c3k2S0pzVDg="),
            entity_id: "8a8294174b7ecb28014b9699220015ca".to_string(),
            test_mode: None,
        };
        let client = HyperPayClient::new(&config, Duration::from_secs(5)).unwrap();
        let service = PaymentService::new(Some(client), "https://atelier.sa/checkout/result".into());

        let id = PaymentCheckoutId::parse("ABC123").unwrap();
        let result = service.verify(&id).await;
        assert_eq!(result.status, PaymentStatus::Error);
        assert!(result.result_code.is_none());
    }

    #[tokio::test]
    async fn test_verify_unknown_code_fails_closed() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "code": "900.100.300", "description": "timeout, uncertain result" }
            })))
            .mount(&server)
            .await;

        let config = HyperPayConfig {
            base_url: server.uri(),
            access_token: SecretString::from("OGE4Mjk0MTc0YjdlY2IyODAxNGI5Njk5MjIwMDE1Y2N8c3k2S0pzVDg="),
            entity_id: "8a8294174b7ecb28014b9699220015ca".to_string(),
            test_mode: None,
        };
        let client = HyperPayClient::new(&config, Duration::from_secs(5)).unwrap();
        let service = PaymentService::new(Some(client), "https://atelier.sa/checkout/result".into());

        let id = PaymentCheckoutId::parse("ABC123").unwrap();
        assert_eq!(service.verify(&id).await.status, PaymentStatus::Failed);
    }
}
