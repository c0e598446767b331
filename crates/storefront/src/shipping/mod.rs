//! Shipping rate quotes.
//!
//! Live rates come from DHL Express and Aramex when they are configured; both
//! are asked concurrently and any provider failure is logged and skipped. When
//! no live rate comes back the static table in [`fallback`] answers instead,
//! so a quote request never fails because of a provider.

pub mod aramex;
pub mod dhl;
pub mod fallback;

use std::fmt;
use std::time::Duration;

use atelier_core::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::ShippingConfig;
use crate::context::normalize_country;

pub use aramex::AramexClient;
pub use dhl::DhlClient;

/// Weight assumed per item when the client sends none.
pub const DEFAULT_ITEM_WEIGHT_KG: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Who quoted a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Dhl,
    Aramex,
    /// The static fallback table.
    Standard,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dhl => "dhl",
            Self::Aramex => "aramex",
            Self::Standard => "standard",
        })
    }
}

/// Errors from quoting shipping rates.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// Request body failed validation.
    #[error("invalid shipping request: {0}")]
    InvalidInput(&'static str),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Provider answered but reported errors.
    #[error("{provider} error: {message}")]
    Provider { provider: Provider, message: String },

    /// Provider response could not be used.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// `POST /api/shipping/rates` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequestBody {
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<Decimal>,
    pub item_count: u32,
}

/// A validated rate request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateQuery {
    /// ISO 3166-1 alpha-2, uppercase.
    pub destination_country: String,
    pub destination_city: String,
    pub postcode: Option<String>,
    pub weight_kg: Decimal,
}

impl RateRequestBody {
    /// Validate and fill in the default weight.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::InvalidInput` for an empty or non-ISO country,
    /// zero items, or a negative weight.
    pub fn into_query(self) -> Result<(RateQuery, u32), ShippingError> {
        if self.country.trim().is_empty() {
            return Err(ShippingError::InvalidInput("country is required"));
        }
        let destination_country = normalize_country(&self.country).ok_or(
            ShippingError::InvalidInput("country must be an ISO 3166-1 alpha-2 code"),
        )?;
        if self.item_count == 0 {
            return Err(ShippingError::InvalidInput("itemCount must be at least 1"));
        }
        let weight_kg = match self.weight_kg {
            Some(w) if w.is_sign_negative() && !w.is_zero() => {
                return Err(ShippingError::InvalidInput("weightKg must not be negative"));
            }
            Some(w) if w > Decimal::ZERO => w,
            _ => DEFAULT_ITEM_WEIGHT_KG * Decimal::from(self.item_count),
        };

        Ok((
            RateQuery {
                destination_country,
                destination_city: self.city.trim().to_string(),
                postcode: self
                    .postcode
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty()),
                weight_kg,
            },
            self.item_count,
        ))
    }
}

/// One quoted option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRate {
    pub provider: Provider,
    pub service: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_days: Option<u32>,
}

/// Where the quoted rates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    Live,
    Fallback,
}

/// Response of a rate lookup.
#[derive(Debug, Clone, Serialize)]
pub struct RateQuote {
    pub rates: Vec<ShippingRate>,
    pub source: RateSource,
}

/// Quotes shipping from the configured origin.
#[derive(Clone)]
pub struct ShippingService {
    origin_country: String,
    origin_city: String,
    dhl: Option<DhlClient>,
    aramex: Option<AramexClient>,
}

impl ShippingService {
    /// Build the service and a client for every configured provider.
    ///
    /// # Errors
    ///
    /// Returns error if a provider HTTP client fails to build.
    pub fn new(config: &ShippingConfig, timeout: Duration) -> Result<Self, ShippingError> {
        Ok(Self {
            origin_country: config.origin_country.clone(),
            origin_city: config.origin_city.clone(),
            dhl: config
                .dhl
                .as_ref()
                .map(|c| DhlClient::new(c, timeout))
                .transpose()?,
            aramex: config
                .aramex
                .as_ref()
                .map(|c| AramexClient::new(c, timeout))
                .transpose()?,
        })
    }

    /// Names of the configured live providers.
    #[must_use]
    pub fn providers(&self) -> Vec<Provider> {
        let mut providers = Vec::new();
        if self.dhl.is_some() {
            providers.push(Provider::Dhl);
        }
        if self.aramex.is_some() {
            providers.push(Provider::Aramex);
        }
        providers
    }

    /// Quote a validated request. Never fails.
    #[instrument(skip(self, query), fields(destination = %query.destination_country))]
    pub async fn quote(
        &self,
        query: &RateQuery,
        item_count: u32,
        currency: CurrencyCode,
    ) -> RateQuote {
        let origin_country = self.origin_country.as_str();
        let origin_city = self.origin_city.as_str();

        let dhl = async {
            match &self.dhl {
                Some(client) => Some(client.rates(origin_country, origin_city, query).await),
                None => None,
            }
        };
        let aramex = async {
            match &self.aramex {
                Some(client) => Some(
                    client
                        .rates(origin_country, origin_city, query, item_count, currency.code())
                        .await,
                ),
                None => None,
            }
        };

        let (dhl, aramex) = tokio::join!(dhl, aramex);

        let mut rates = Vec::new();
        for (provider, outcome) in [(Provider::Dhl, dhl), (Provider::Aramex, aramex)] {
            match outcome {
                Some(Ok(found)) => rates.extend(found),
                Some(Err(e)) => warn!(provider = %provider, error = %e, "Shipping provider failed"),
                None => {}
            }
        }

        if rates.is_empty() {
            info!("No live shipping rates, using fallback table");
            return RateQuote {
                rates: vec![fallback::fallback_rate(
                    origin_country,
                    &query.destination_country,
                )],
                source: RateSource::Fallback,
            };
        }

        rates.sort_by_key(|r| r.amount);
        RateQuote {
            rates,
            source: RateSource::Live,
        }
    }
}

/// Decode a provider answer; any non-success status is a transport error.
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    provider: &'static str,
) -> Result<T, ShippingError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        warn!(
            provider,
            status = %status,
            body = %text.chars().take(500).collect::<String>(),
            "Shipping provider returned non-success status"
        );
        return Err(ShippingError::Status {
            status: status.as_u16(),
            message: text.chars().take(200).collect(),
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        warn!(
            provider,
            error = %e,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse shipping provider response"
        );
        ShippingError::MalformedResponse(e.to_string())
    })
}
