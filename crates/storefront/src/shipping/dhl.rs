//! DHL Express rates (`MyDHL` API).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::config::DhlConfig;

use super::{Provider, RateQuery, ShippingError, ShippingRate, read_json};

/// Parcel dimensions in centimetres (length, width, height).
const DEFAULT_DIMENSIONS_CM: (u32, u32, u32) = (30, 20, 10);

/// Price entry billed to the shipper's account.
const BILLING_CURRENCY_TYPE: &str = "BILLC";

/// DHL Express rating client.
#[derive(Clone)]
pub struct DhlClient {
    inner: Arc<DhlClientInner>,
}

struct DhlClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: SecretString,
    account_number: String,
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    products: Vec<DhlProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DhlProduct {
    product_name: Option<String>,
    product_code: Option<String>,
    #[serde(default)]
    total_price: Vec<DhlPrice>,
    delivery_capabilities: Option<DeliveryCapabilities>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DhlPrice {
    currency_type: Option<String>,
    price_currency: Option<String>,
    price: Option<serde_json::Number>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryCapabilities {
    total_transit_days: Option<u32>,
}

impl DhlClient {
    /// Create a new DHL client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &DhlConfig, timeout: Duration) -> Result<Self, ShippingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self {
            inner: Arc::new(DhlClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
                api_secret: config.api_secret.clone(),
                account_number: config.account_number.clone(),
            }),
        })
    }

    /// Quote every DHL product for a parcel.
    ///
    /// # Errors
    ///
    /// Returns a transport error or `ShippingError::MalformedResponse`.
    #[instrument(skip(self, query), fields(destination = %query.destination_country))]
    pub async fn rates(
        &self,
        origin_country: &str,
        origin_city: &str,
        query: &RateQuery,
    ) -> Result<Vec<ShippingRate>, ShippingError> {
        let (length, width, height) = DEFAULT_DIMENSIONS_CM;
        let planned = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let customs = !origin_country.eq_ignore_ascii_case(&query.destination_country);

        let mut url = Url::parse(&format!("{}/rates", self.inner.base_url))
            .map_err(|e| ShippingError::MalformedResponse(format!("DHL URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("accountNumber", &self.inner.account_number)
            .append_pair("originCountryCode", origin_country)
            .append_pair("originCityName", origin_city)
            .append_pair("destinationCountryCode", &query.destination_country)
            .append_pair("destinationCityName", &query.destination_city)
            .append_pair("weight", &query.weight_kg.round_dp(3).to_string())
            .append_pair("length", &length.to_string())
            .append_pair("width", &width.to_string())
            .append_pair("height", &height.to_string())
            .append_pair("plannedShippingDate", &planned)
            .append_pair("isCustomsDeclarable", if customs { "true" } else { "false" })
            .append_pair("unitOfMeasurement", "metric");
        if let Some(postcode) = &query.postcode {
            url.query_pairs_mut()
                .append_pair("destinationPostalCode", postcode);
        }

        let response = self
            .inner
            .client
            .get(url)
            .basic_auth(
                &self.inner.api_key,
                Some(self.inner.api_secret.expose_secret()),
            )
            .send()
            .await?;

        let body: RatesResponse = read_json(response, "DHL").await?;
        let rates: Vec<ShippingRate> = body.products.into_iter().filter_map(convert).collect();
        debug!(count = rates.len(), "DHL rates received");
        Ok(rates)
    }
}

fn convert(product: DhlProduct) -> Option<ShippingRate> {
    let price = product
        .total_price
        .iter()
        .find(|p| p.currency_type.as_deref() == Some(BILLING_CURRENCY_TYPE))
        .or_else(|| product.total_price.first())?;

    let amount = Decimal::from_str(&price.price.as_ref()?.to_string()).ok()?;
    if amount <= Decimal::ZERO {
        return None;
    }

    Some(ShippingRate {
        provider: Provider::Dhl,
        service: product
            .product_name
            .or(product.product_code)
            .unwrap_or_else(|| "DHL Express".to_string()),
        amount,
        currency: price.price_currency.clone()?,
        estimated_days: product
            .delivery_capabilities
            .and_then(|d| d.total_transit_days),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> DhlClient {
        let config = DhlConfig {
            base_url: server.uri(),
            api_key: "apX1bY2cZ3".to_string(),
            api_secret: SecretString::from("Q7w!e9R$t2Y"),
            account_number: "451234567".to_string(),
        };
        DhlClient::new(&config, Duration::from_secs(5)).unwrap()
    }

    fn query() -> RateQuery {
        RateQuery {
            destination_country: "AE".to_string(),
            destination_city: "Dubai".to_string(),
            postcode: None,
            weight_kg: Decimal::new(15, 1),
        }
    }

    #[tokio::test]
    async fn test_rates_prefers_billing_currency() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rates"))
            .and(header_exists("authorization"))
            .and(query_param("accountNumber", "451234567"))
            .and(query_param("destinationCountryCode", "AE"))
            .and(query_param("weight", "1.5"))
            .and(query_param("isCustomsDeclarable", "true"))
            .and(query_param("unitOfMeasurement", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "products": [{
                    "productName": "EXPRESS WORLDWIDE",
                    "productCode": "P",
                    "totalPrice": [
                        { "currencyType": "PULCL", "priceCurrency": "USD", "price": 31.2 },
                        { "currencyType": "BILLC", "priceCurrency": "SAR", "price": 117.5 }
                    ],
                    "deliveryCapabilities": { "totalTransitDays": 2 }
                }, {
                    "productName": "NO PRICE",
                    "totalPrice": []
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let rates = client_for(&server)
            .rates("SA", "Riyadh", &query())
            .await
            .unwrap();

        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].provider, Provider::Dhl);
        assert_eq!(rates[0].service, "EXPRESS WORLDWIDE");
        assert_eq!(rates[0].amount, Decimal::new(1175, 1));
        assert_eq!(rates[0].currency, "SAR");
        assert_eq!(rates[0].estimated_days, Some(2));
    }

    #[tokio::test]
    async fn test_rates_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "title": "Unauthorized", "status": 401
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .rates("SA", "Riyadh", &query())
            .await
            .unwrap_err();
        assert!(matches!(err, ShippingError::Status { status: 401, .. }));
    }
}
