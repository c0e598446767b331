//! Aramex rate calculator (JSON endpoint of the SOAP service).

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::AramexConfig;

use super::{Provider, RateQuery, ShippingError, ShippingRate, read_json};

const CALCULATE_RATE_PATH: &str = "/RateCalculator/Service_1_0.svc/json/CalculateRate";
const API_VERSION: &str = "v1.0";
const API_SOURCE: u32 = 24;

/// Aramex rating client.
#[derive(Clone)]
pub struct AramexClient {
    inner: Arc<AramexClientInner>,
}

struct AramexClientInner {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: SecretString,
    account_number: String,
    account_pin: SecretString,
    account_entity: String,
    account_country_code: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RateRequest<'a> {
    client_info: ClientInfo<'a>,
    origin_address: RateAddress<'a>,
    destination_address: RateAddress<'a>,
    shipment_details: ShipmentDetails,
    preferred_currency_code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ClientInfo<'a> {
    user_name: &'a str,
    password: &'a str,
    version: &'static str,
    account_number: &'a str,
    account_pin: &'a str,
    account_entity: &'a str,
    account_country_code: &'a str,
    source: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RateAddress<'a> {
    line1: &'a str,
    city: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_code: Option<&'a str>,
    country_code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ShipmentDetails {
    payment_type: &'static str,
    product_group: &'static str,
    product_type: &'static str,
    actual_weight: Weight,
    chargeable_weight: Weight,
    number_of_pieces: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Weight {
    unit: &'static str,
    value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RateResponse {
    #[serde(default)]
    has_errors: bool,
    #[serde(default)]
    notifications: Vec<Notification>,
    total_amount: Option<Money>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Notification {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Money {
    currency_code: String,
    value: Decimal,
}

impl AramexClient {
    /// Create a new Aramex client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &AramexConfig, timeout: Duration) -> Result<Self, ShippingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self {
            inner: Arc::new(AramexClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                username: config.username.clone(),
                password: config.password.clone(),
                account_number: config.account_number.clone(),
                account_pin: config.account_pin.clone(),
                account_entity: config.account_entity.clone(),
                account_country_code: config.account_country_code.clone(),
            }),
        })
    }

    /// Quote one parcel. Domestic shipments use the overnight product,
    /// everything else priority express.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::Provider` when Aramex reports errors, or a
    /// transport error.
    #[instrument(skip(self, query), fields(destination = %query.destination_country))]
    pub async fn rates(
        &self,
        origin_country: &str,
        origin_city: &str,
        query: &RateQuery,
        item_count: u32,
        currency: &str,
    ) -> Result<Vec<ShippingRate>, ShippingError> {
        let domestic = origin_country.eq_ignore_ascii_case(&query.destination_country);
        let (product_group, product_type, service) = if domestic {
            ("DOM", "ONP", "Domestic Overnight")
        } else {
            ("EXP", "PPX", "Priority Parcel Express")
        };

        let weight = query.weight_kg.round_dp(3).to_f64().unwrap_or(0.5);
        let body = RateRequest {
            client_info: ClientInfo {
                user_name: &self.inner.username,
                password: self.inner.password.expose_secret(),
                version: API_VERSION,
                account_number: &self.inner.account_number,
                account_pin: self.inner.account_pin.expose_secret(),
                account_entity: &self.inner.account_entity,
                account_country_code: &self.inner.account_country_code,
                source: API_SOURCE,
            },
            origin_address: RateAddress {
                line1: origin_city,
                city: origin_city,
                post_code: None,
                country_code: origin_country,
            },
            destination_address: RateAddress {
                line1: &query.destination_city,
                city: &query.destination_city,
                post_code: query.postcode.as_deref(),
                country_code: &query.destination_country,
            },
            shipment_details: ShipmentDetails {
                payment_type: "P",
                product_group,
                product_type,
                actual_weight: Weight {
                    unit: "KG",
                    value: weight,
                },
                chargeable_weight: Weight {
                    unit: "KG",
                    value: weight,
                },
                number_of_pieces: item_count.max(1),
            },
            preferred_currency_code: currency,
        };

        let response = self
            .inner
            .client
            .post(format!("{}{CALCULATE_RATE_PATH}", self.inner.base_url))
            .json(&body)
            .send()
            .await?;

        let rate: RateResponse = read_json(response, "Aramex").await?;

        if rate.has_errors {
            let message = rate
                .notifications
                .iter()
                .map(|n| {
                    format!(
                        "{}: {}",
                        n.code.as_deref().unwrap_or("?"),
                        n.message.as_deref().unwrap_or_default()
                    )
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ShippingError::Provider {
                provider: Provider::Aramex,
                message,
            });
        }

        let total = rate.total_amount.ok_or_else(|| {
            ShippingError::MalformedResponse("Aramex response has no TotalAmount".to_string())
        })?;
        debug!(amount = %total.value, currency = %total.currency_code, "Aramex rate received");

        Ok(vec![ShippingRate {
            provider: Provider::Aramex,
            service: service.to_string(),
            amount: total.value,
            currency: total.currency_code,
            estimated_days: None,
        }])
    }
}
