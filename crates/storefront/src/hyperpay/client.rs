//! `HyperPay` REST client.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use atelier_core::{CurrencyCode, PaymentCheckoutId};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::HyperPayConfig;

use super::codes::{classify, is_session_created};
use super::types::{
    Address, CheckoutResponse, PaymentRequest, PaymentResult, PaymentSession,
    PaymentStatusResponse,
};
use super::HyperPayError;

/// Debit: authorize and capture in one step.
const PAYMENT_TYPE: &str = "DB";

/// `HyperPay` REST API client.
#[derive(Clone)]
pub struct HyperPayClient {
    inner: Arc<HyperPayClientInner>,
}

struct HyperPayClientInner {
    client: reqwest::Client,
    base_url: String,
    entity_id: String,
    test_mode: Option<String>,
}

impl HyperPayClient {
    /// Create a new `HyperPay` client.
    ///
    /// # Errors
    ///
    /// Returns error if the access token is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &HyperPayConfig, timeout: Duration) -> Result<Self, HyperPayError> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!(
            "Bearer {}",
            config.access_token.expose_secret()
        ))
        .map_err(|e| HyperPayError::MalformedResponse(format!("Invalid token format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self {
            inner: Arc::new(HyperPayClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                entity_id: config.entity_id.clone(),
                test_mode: config.test_mode.clone(),
            }),
        })
    }

    /// Gateway origin, also used by the browser to load the widget.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Open a checkout session.
    ///
    /// Every call creates a new session; the gateway does not deduplicate.
    ///
    /// # Errors
    ///
    /// Returns `HyperPayError::Rejected` with the gateway's description when
    /// the result code is not a session-created code, or a transport error.
    #[instrument(skip(self, request, shopper_result_url), fields(amount = %request.price))]
    pub async fn create_checkout(
        &self,
        request: &PaymentRequest,
        shopper_result_url: &str,
    ) -> Result<PaymentSession, HyperPayError> {
        let merchant_transaction_id = uuid::Uuid::new_v4().to_string();
        let params = self.checkout_params(request, shopper_result_url, &merchant_transaction_id);

        let response = self
            .inner
            .client
            .post(format!("{}/v1/checkouts", self.inner.base_url))
            .form(&params)
            .send()
            .await?;

        let body: CheckoutResponse = read_json(response).await?;
        let result = body
            .result
            .ok_or_else(|| HyperPayError::MalformedResponse("missing result".to_string()))?;

        if !is_session_created(&result.code) {
            warn!(
                code = %result.code,
                description = %result.description,
                "HyperPay refused to create checkout"
            );
            return Err(HyperPayError::Rejected {
                code: result.code,
                description: result.description,
            });
        }

        let id = body
            .id
            .ok_or_else(|| HyperPayError::MalformedResponse("missing checkout id".to_string()))?;
        let checkout_id = PaymentCheckoutId::parse(&id)
            .map_err(|e| HyperPayError::MalformedResponse(format!("checkout id: {e}")))?;

        debug!(
            checkout_id = %checkout_id,
            merchant_transaction_id = %merchant_transaction_id,
            "HyperPay checkout created"
        );

        Ok(PaymentSession {
            checkout_id,
            base_url: self.inner.base_url.clone(),
        })
    }

    /// Query the authoritative payment status for a checkout.
    ///
    /// A 4xx answer that still carries a result code is classified like any
    /// other answer.
    ///
    /// # Errors
    ///
    /// Returns a transport error, or `HyperPayError::MalformedResponse` when
    /// the answer has no result code.
    #[instrument(skip(self), fields(checkout_id = %checkout_id))]
    pub async fn payment_status(
        &self,
        checkout_id: &PaymentCheckoutId,
    ) -> Result<PaymentResult, HyperPayError> {
        let mut url = Url::parse(&self.inner.base_url)
            .map_err(|e| HyperPayError::MalformedResponse(format!("status URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| HyperPayError::MalformedResponse("status URL: no path".to_string()))?
            .pop_if_empty()
            .extend(["v1", "checkouts", checkout_id.as_str(), "payment"]);
        url.query_pairs_mut()
            .append_pair("entityId", &self.inner.entity_id);

        let response = self.inner.client.get(url).send().await?;
        let body: PaymentStatusResponse = read_json(response).await?;

        let result = body.result.ok_or_else(|| {
            HyperPayError::MalformedResponse("missing result code".to_string())
        })?;

        let status = classify(&result.code);
        debug!(code = %result.code, status = %status, "HyperPay payment classified");

        Ok(PaymentResult {
            status,
            transaction_id: body.id.or(body.merchant_transaction_id),
            amount: body.amount.and_then(|a| Decimal::from_str(&a).ok()),
            currency: body
                .currency
                .and_then(|c| c.parse::<CurrencyCode>().ok()),
            result_code: Some(result.code),
            description: Some(result.description).filter(|d| !d.is_empty()),
        })
    }

    fn checkout_params(
        &self,
        request: &PaymentRequest,
        shopper_result_url: &str,
        merchant_transaction_id: &str,
    ) -> Vec<(String, String)> {
        let mut params = vec![
            ("entityId".to_string(), self.inner.entity_id.clone()),
            ("amount".to_string(), request.price.gateway_amount()),
            (
                "currency".to_string(),
                request.price.currency_code().code().to_string(),
            ),
            ("paymentType".to_string(), PAYMENT_TYPE.to_string()),
            (
                "merchantTransactionId".to_string(),
                merchant_transaction_id.to_string(),
            ),
            (
                "customer.email".to_string(),
                request.customer.email.as_str().to_string(),
            ),
            ("shopperResultUrl".to_string(), shopper_result_url.to_string()),
        ];

        let customer = &request.customer;
        push_opt(&mut params, "customer.givenName", customer.given_name.as_deref());
        push_opt(&mut params, "customer.surname", customer.surname.as_deref());
        push_opt(&mut params, "customer.mobile", customer.mobile.as_deref());

        if let Some(billing) = &request.billing {
            push_address(&mut params, "billing", billing);
        }
        if let Some(shipping) = &request.shipping {
            push_address(&mut params, "shipping", shipping);
        }

        for (i, item) in request.items.iter().enumerate() {
            params.push((format!("cart.items[{i}].name"), item.name.clone()));
            params.push((format!("cart.items[{i}].quantity"), item.quantity.to_string()));
            params.push((format!("cart.items[{i}].price"), format!("{:.2}", item.unit_price)));
        }

        if let Some(method) = &request.shipping_method {
            params.push((
                "customParameters[SHIPPING_METHOD]".to_string(),
                method.name.clone(),
            ));
            params.push((
                "customParameters[SHIPPING_COST]".to_string(),
                format!("{:.2}", method.cost),
            ));
        }

        if let Some(mode) = &self.inner.test_mode {
            params.push(("testMode".to_string(), mode.clone()));
        }

        params
    }
}

fn push_opt(params: &mut Vec<(String, String)>, key: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        params.push((key.to_string(), value.to_string()));
    }
}

fn push_address(params: &mut Vec<(String, String)>, prefix: &str, address: &Address) {
    push_opt(params, &format!("{prefix}.street1"), address.street.as_deref());
    push_opt(params, &format!("{prefix}.city"), address.city.as_deref());
    push_opt(params, &format!("{prefix}.state"), address.state.as_deref());
    push_opt(params, &format!("{prefix}.country"), address.country.as_deref());
    push_opt(params, &format!("{prefix}.postcode"), address.postcode.as_deref());
}

/// Decode a gateway answer.
///
/// The gateway reports most failures as 4xx with a JSON `result`, so a
/// non-success body is used when it carries `result.code`. Anything else with
/// a non-success status (proxy pages, bare JSON errors) is a transport error.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, HyperPayError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let has_code = serde_json::from_str::<serde_json::Value>(&text)
            .is_ok_and(|value| value["result"]["code"].is_string());
        if !has_code {
            tracing::error!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "HyperPay returned non-success status"
            );
            return Err(HyperPayError::Status {
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            });
        }
    }

    serde_json::from_str::<T>(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse HyperPay response"
        );
        HyperPayError::MalformedResponse(e.to_string())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atelier_core::{Email, PaymentStatus, Price};
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::hyperpay::types::{Customer, PaymentItem, ShippingMethod};

    fn client_for(server: &MockServer, test_mode: Option<&str>) -> HyperPayClient {
        let config = HyperPayConfig {
            base_url: server.uri(),
            access_token: SecretString::from("OGE4Mjk0MTc0YjdlY2IyODAxNGI5Njk5MjIwMDE1Y2N8c3k2S0pzVDg="),
            entity_id: "8a8294174b7ecb28014b9699220015ca".to_string(),
            test_mode: test_mode.map(String::from),
        };
        HyperPayClient::new(&config, Duration::from_secs(5)).unwrap()
    }

    fn request() -> PaymentRequest {
        PaymentRequest {
            price: Price::new(Decimal::new(37400, 2), CurrencyCode::SAR).unwrap(),
            customer: Customer {
                email: Email::parse("noura@example.sa").unwrap(),
                given_name: Some("Noura".to_string()),
                surname: Some("Al-Harbi".to_string()),
                mobile: None,
            },
            billing: None,
            shipping: Some(Address {
                street: Some("King Fahd Rd 12".to_string()),
                city: Some("Riyadh".to_string()),
                state: None,
                country: Some("SA".to_string()),
                postcode: Some("12211".to_string()),
            }),
            items: vec![PaymentItem {
                name: "Linen Abaya".to_string(),
                quantity: 1,
                unit_price: Decimal::new(349, 0),
            }],
            shipping_method: Some(ShippingMethod {
                name: "Aramex".to_string(),
                cost: Decimal::new(25, 0),
            }),
        }
    }

    #[tokio::test]
    async fn test_create_checkout_sends_form() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/checkouts"))
            .and(header(
                "authorization",
                "Bearer OGE4Mjk0MTc0YjdlY2IyODAxNGI5Njk5MjIwMDE1Y2N8c3k2S0pzVDg=",
            ))
            .and(body_string_contains("amount=374.00"))
            .and(body_string_contains("currency=SAR"))
            .and(body_string_contains("paymentType=DB"))
            .and(body_string_contains("customer.email=noura%40example.sa"))
            .and(body_string_contains("shipping.city=Riyadh"))
            .and(body_string_contains("cart.items%5B0%5D.price=349.00"))
            .and(body_string_contains("customParameters%5BSHIPPING_COST%5D=25.00"))
            .and(body_string_contains("testMode=EXTERNAL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "code": "000.200.100", "description": "successfully created checkout" },
                "buildNumber": "b1",
                "id": "E5C2A6F1B3D94E8AA0C7.uat01-vm-tx04"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("EXTERNAL"));
        let session = client
            .create_checkout(&request(), "https://atelier.sa/checkout/result")
            .await
            .unwrap();

        assert_eq!(session.checkout_id.as_str(), "E5C2A6F1B3D94E8AA0C7.uat01-vm-tx04");
        assert_eq!(session.base_url, server.uri());
        assert!(session.widget_url().ends_with(
            "/v1/paymentWidgets.js?checkoutId=E5C2A6F1B3D94E8AA0C7.uat01-vm-tx04"
        ));
    }

    #[tokio::test]
    async fn test_create_checkout_rejected_surfaces_description() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/checkouts"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "result": {
                    "code": "200.300.404",
                    "description": "invalid or missing parameter"
                }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .create_checkout(&request(), "https://atelier.sa/checkout/result")
            .await
            .unwrap_err();

        match err {
            HyperPayError::Rejected { code, description } => {
                assert_eq!(code, "200.300.404");
                assert_eq!(description, "invalid or missing parameter");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_create_checkout_gateway_down() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .create_checkout(&request(), "https://atelier.sa/checkout/result")
            .await
            .unwrap_err();
        assert!(matches!(err, HyperPayError::Status { status: 502, .. }));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_json_error_without_result_code_is_transport() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({ "message": "Service Unavailable" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .create_checkout(&request(), "https://atelier.sa/checkout/result")
            .await
            .unwrap_err();
        assert!(matches!(err, HyperPayError::Status { status: 503, .. }));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_payment_status_keeps_id_in_one_segment() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/checkouts/8A82944A4CC25EBF.uat01-vm-tx04/payment"))
            .and(query_param("entityId", "8a8294174b7ecb28014b9699220015ca"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "code": "000.200.000", "description": "transaction pending" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let id = PaymentCheckoutId::parse("8A82944A4CC25EBF.uat01-vm-tx04").unwrap();
        let result = client_for(&server, None).payment_status(&id).await.unwrap();
        assert_eq!(result.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_payment_status_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/checkouts/ABC123.uat01/payment"))
            .and(query_param("entityId", "8a8294174b7ecb28014b9699220015ca"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "8ac7a4a28f1b2c3d",
                "paymentType": "DB",
                "amount": "374.00",
                "currency": "SAR",
                "merchantTransactionId": "0d5b9c8e-2f1a-4c5e-9b7a-2a3c4d5e6f70",
                "result": {
                    "code": "000.400.100",
                    "description": "Request successfully processed; manual review"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let id = PaymentCheckoutId::parse("ABC123.uat01").unwrap();
        let result = client_for(&server, None).payment_status(&id).await.unwrap();

        assert_eq!(result.status, PaymentStatus::Success);
        assert_eq!(result.transaction_id.as_deref(), Some("8ac7a4a28f1b2c3d"));
        assert_eq!(result.amount, Some(Decimal::new(37400, 2)));
        assert_eq!(result.currency, Some(CurrencyCode::SAR));
        assert_eq!(result.result_code.as_deref(), Some("000.400.100"));
    }

    #[tokio::test]
    async fn test_payment_status_client_error_with_code_is_classified() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "result": {
                    "code": "800.100.100",
                    "description": "transaction declined for unknown reason"
                }
            })))
            .mount(&server)
            .await;

        let id = PaymentCheckoutId::parse("ABC123").unwrap();
        let result = client_for(&server, None).payment_status(&id).await.unwrap();

        assert_eq!(result.status, PaymentStatus::Failed);
        assert_eq!(
            result.description.as_deref(),
            Some("transaction declined for unknown reason")
        );
    }

    #[tokio::test]
    async fn test_payment_status_without_code_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "x" })))
            .mount(&server)
            .await;

        let id = PaymentCheckoutId::parse("ABC123").unwrap();
        let err = client_for(&server, None)
            .payment_status(&id)
            .await
            .unwrap_err();
        assert!(matches!(err, HyperPayError::MalformedResponse(_)));
    }
}
