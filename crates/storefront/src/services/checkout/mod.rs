//! Hosted checkout: resolve cart lines against the catalog and open a
//! Shopify cart.
//!
//! Client-supplied variant IDs are never used; every line is re-resolved from
//! the display name and size label against a fresh catalog snapshot.

pub mod resolver;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use atelier_core::CartGid;

use crate::context::StoreContext;
use crate::shopify::{CartLineInput, ShopifyError, StorefrontClient};

pub use resolver::{ProductMatch, Resolution, ResolvedLine, VariantMatch, resolve_lines};

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Request carried no items.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line failed validation.
    #[error("invalid cart line {index}: {reason}")]
    InvalidLine { index: usize, reason: &'static str },

    /// No line matched any catalog product.
    #[error("product list does not match catalog (unmatched: {})", .unmatched.join(", "))]
    NoMatchingProducts { unmatched: Vec<String> },

    /// Shopify credentials are not configured.
    #[error("commerce platform is not configured")]
    NotConfigured,

    /// Shopify call failed or rejected the cart.
    #[error(transparent)]
    Shopify(#[from] ShopifyError),
}

impl CheckoutError {
    /// Whether the shopper can reasonably try the same request again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Shopify(e) => e.is_transport(),
            _ => false,
        }
    }
}

/// One item as posted by the storefront client.
///
/// `nameEn` wins over `name` when both are present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Accepted for compatibility, never trusted.
    #[serde(default)]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

/// A validated cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub display_name: String,
    pub size_label: String,
    pub quantity: u32,
    pub unit_price: Option<Decimal>,
}

impl CartLine {
    fn from_item(index: usize, item: CheckoutItem) -> Result<Self, CheckoutError> {
        let display_name = item
            .name_en
            .filter(|n| !n.trim().is_empty())
            .or_else(|| item.name.filter(|n| !n.trim().is_empty()))
            .ok_or(CheckoutError::InvalidLine {
                index,
                reason: "missing product name",
            })?;

        let quantity = item
            .quantity
            .and_then(|q| u32::try_from(q).ok())
            .filter(|q| *q >= 1)
            .ok_or(CheckoutError::InvalidLine {
                index,
                reason: "quantity must be a positive integer",
            })?;

        if item.unit_price.is_some_and(|p| p.is_sign_negative()) {
            return Err(CheckoutError::InvalidLine {
                index,
                reason: "unit price must not be negative",
            });
        }

        if let Some(variant_id) = &item.variant_id {
            debug!(index, variant_id = %variant_id, "Ignoring client-supplied variant ID");
        }

        Ok(Self {
            display_name: display_name.trim().to_string(),
            size_label: item.size.unwrap_or_default().trim().to_string(),
            quantity,
            unit_price: item.unit_price,
        })
    }
}

/// Validate posted items into cart lines.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` for an empty list and
/// `CheckoutError::InvalidLine` for the first invalid item.
pub fn parse_items(items: Vec<CheckoutItem>) -> Result<Vec<CartLine>, CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| CartLine::from_item(index, item))
        .collect()
}

/// A created Shopify cart ready for hosted checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub id: CartGid,
    pub redirect_url: String,
}

/// Resolves carts and creates Shopify checkout sessions.
#[derive(Clone)]
pub struct CheckoutService {
    shopify: Option<StorefrontClient>,
}

impl CheckoutService {
    #[must_use]
    pub const fn new(shopify: Option<StorefrontClient>) -> Self {
        Self { shopify }
    }

    /// Whether a Storefront client is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.shopify.is_some()
    }

    fn client(&self) -> Result<&StorefrontClient, CheckoutError> {
        self.shopify.as_ref().ok_or_else(|| {
            tracing::error!(
                "Shopify is not configured; set SHOPIFY_STORE and SHOPIFY_STOREFRONT_PRIVATE_TOKEN"
            );
            CheckoutError::NotConfigured
        })
    }

    /// Resolve lines against the live catalog without creating a cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotConfigured` without Shopify credentials or a
    /// `CheckoutError::Shopify` error if the catalog cannot be loaded.
    #[instrument(skip(self, lines, context), fields(line_count = lines.len()))]
    pub async fn resolve(
        &self,
        lines: &[CartLine],
        context: &StoreContext,
    ) -> Result<Resolution, CheckoutError> {
        let catalog = self.client()?.fetch_catalog(context).await?;
        let resolution = resolve_lines(&catalog, lines);

        if !resolution.unmatched.is_empty() {
            warn!(
                unmatched = ?resolution.unmatched,
                resolved = resolution.lines.len(),
                "Cart lines did not match the catalog"
            );
        }

        Ok(resolution)
    }

    /// Resolve lines and create a cart holding exactly the resolved lines.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` when `lines` is empty,
    /// `CheckoutError::NoMatchingProducts` when nothing resolves, or the
    /// underlying configuration / Shopify error.
    #[instrument(skip(self, lines, context), fields(line_count = lines.len()))]
    pub async fn create_checkout(
        &self,
        lines: &[CartLine],
        context: &StoreContext,
    ) -> Result<CheckoutSession, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let client = self.client()?;
        let resolution = self.resolve(lines, context).await?;
        if resolution.lines.is_empty() {
            return Err(CheckoutError::NoMatchingProducts {
                unmatched: resolution.unmatched,
            });
        }

        let inputs: Vec<CartLineInput> = resolution
            .lines
            .into_iter()
            .map(CartLineInput::from)
            .collect();
        let cart = client.create_cart(inputs, context).await?;

        info!(
            cart_id = %cart.id,
            total_quantity = cart.total_quantity,
            "Checkout session created"
        );

        Ok(CheckoutSession {
            id: cart.id,
            redirect_url: cart.checkout_url,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use atelier_core::CurrencyCode;
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ShopifyStorefrontConfig;

    fn item(value: serde_json::Value) -> CheckoutItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_items_prefers_english_name() {
        let lines = parse_items(vec![item(json!({
            "nameEn": "Linen Abaya",
            "name": "عباية كتان",
            "variantId": "gid://shopify/ProductVariant/666",
            "quantity": 2,
            "size": " M ",
            "unitPrice": "349.00"
        }))])
        .unwrap();

        assert_eq!(lines[0].display_name, "Linen Abaya");
        assert_eq!(lines[0].size_label, "M");
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].unit_price, Some(Decimal::new(34900, 2)));
    }

    #[test]
    fn test_parse_items_falls_back_to_name() {
        let lines = parse_items(vec![item(json!({ "name": "Silk Scarf", "quantity": 1 }))]).unwrap();
        assert_eq!(lines[0].display_name, "Silk Scarf");
        assert_eq!(lines[0].size_label, "");
    }

    #[test]
    fn test_parse_items_rejects_bad_input() {
        assert!(matches!(parse_items(vec![]), Err(CheckoutError::EmptyCart)));
        assert!(matches!(
            parse_items(vec![item(json!({ "nameEn": " ", "quantity": 1 }))]),
            Err(CheckoutError::InvalidLine { index: 0, .. })
        ));
        assert!(matches!(
            parse_items(vec![
                item(json!({ "name": "Silk Scarf", "quantity": 1 })),
                item(json!({ "name": "Silk Scarf", "quantity": 0 })),
            ]),
            Err(CheckoutError::InvalidLine { index: 1, .. })
        ));
        assert!(matches!(
            parse_items(vec![item(json!({ "name": "Silk Scarf" }))]),
            Err(CheckoutError::InvalidLine { index: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_service() {
        let service = CheckoutService::new(None);
        let lines = parse_items(vec![item(json!({ "name": "Silk Scarf", "quantity": 1 }))]).unwrap();
        let err = service
            .create_checkout(&lines, &StoreContext::with_currency(CurrencyCode::SAR))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::NotConfigured));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_nothing_resolved_creates_no_cart() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string_contains("query Catalog"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "products": {
                    "pageInfo": { "hasNextPage": false, "endCursor": null },
                    "nodes": [{
                        "id": "gid://shopify/Product/1",
                        "handle": "linen-abaya",
                        "title": "Linen Abaya",
                        "availableForSale": true,
                        "variants": { "nodes": [] }
                    }]
                }}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("cartCreate"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let config = ShopifyStorefrontConfig {
            store: server.uri(),
            api_version: "2026-01".to_string(),
            storefront_private_token: SecretString::from("aB3xY9mK2nL5pQ7rT0uW4zC6dE8fG1hJ"),
        };
        let client = StorefrontClient::new(&config, Duration::from_secs(5)).unwrap();
        let service = CheckoutService::new(Some(client));

        let lines = parse_items(vec![
            item(json!({ "name": "Velvet Kaftan", "quantity": 1 })),
            item(json!({ "name": "Linen Abaya", "quantity": 1 })),
        ])
        .unwrap();
        let err = service
            .create_checkout(&lines, &StoreContext::with_currency(CurrencyCode::SAR))
            .await
            .unwrap_err();

        match err {
            CheckoutError::NoMatchingProducts { unmatched } => {
                assert_eq!(unmatched, vec!["Velvet Kaftan", "Linen Abaya"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
