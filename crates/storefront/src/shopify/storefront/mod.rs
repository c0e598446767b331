//! Shopify Storefront API client implementation.
//!
//! Hand-written GraphQL documents over `reqwest` 0.13. There is no
//! `graphql_client` codegen or schema download: the two operations live as
//! strings in [`queries`] next to the serde types their responses decode
//! into.
//!
//! Nothing is cached: the catalog is read fresh for every checkout so
//! resolved variant IDs always come from the current snapshot.

pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use atelier_core::{CartGid, MerchandiseId, ProductGid};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::config::ShopifyStorefrontConfig;
use crate::context::{Language, StoreContext};
use crate::shopify::types::{Cart, CartLineInput, CatalogProduct, CatalogVariant};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use queries::{CART_CREATE_MUTATION, CATALOG_QUERY, CartCreateData, CatalogData, ProductNode};

/// Products per catalog page (Storefront API maximum).
const CATALOG_PAGE_SIZE: i64 = 250;

/// Upper bound on catalog pages fetched for one checkout.
pub const MAX_CATALOG_PAGES: usize = 20;

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ShopifyStorefrontConfig, timeout: Duration) -> Result<Self, ShopifyError> {
        let mut headers = HeaderMap::new();

        // Private access tokens use a different header than public tokens
        let mut token = HeaderValue::from_str(config.storefront_private_token.expose_secret())
            .map_err(|e| ShopifyError::MalformedResponse(format!("Invalid token format: {e}")))?;
        token.set_sensitive(true);
        headers.insert("Shopify-Storefront-Private-Token", token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint: config.graphql_endpoint(),
            }),
        })
    }

    /// Execute a GraphQL document.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::RateLimited` on 429, `ShopifyError::Status` on
    /// other non-success codes, `ShopifyError::GraphQL` if the response carries
    /// errors or no data, and `ShopifyError::Http` on network failures.
    #[instrument(skip(self, query, variables))]
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ShopifyError> {
        let body = json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                message: response_text.chars().take(200).collect(),
            });
        }

        let response: GraphQLResponse<T> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors
                    .into_iter()
                    .map(|e| GraphQLError {
                        message: e.message,
                        locations: e
                            .locations
                            .into_iter()
                            .map(|l| GraphQLErrorLocation {
                                line: l.line,
                                column: l.column,
                            })
                            .collect(),
                        path: e.path,
                    })
                    .collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Fetch every product with its variants.
    ///
    /// Titles are always requested in English so they line up with the
    /// English display names sent by the client; only the country comes from
    /// the store context.
    ///
    /// # Errors
    ///
    /// Returns an error if any page fails to load.
    #[instrument(skip(self, context), fields(country = ?context.country))]
    pub async fn fetch_catalog(
        &self,
        context: &StoreContext,
    ) -> Result<Vec<CatalogProduct>, ShopifyError> {
        let mut products = Vec::new();
        let mut after: Option<String> = None;

        for page in 0..MAX_CATALOG_PAGES {
            let variables = json!({
                "first": CATALOG_PAGE_SIZE,
                "after": after,
                "country": context.country,
                "language": Language::En.shopify_code(),
            });

            let data: CatalogData = self.execute(CATALOG_QUERY, variables).await?;
            let connection = data.products;
            products.extend(connection.nodes.into_iter().map(convert_product));

            match connection.page_info.end_cursor {
                Some(cursor) if connection.page_info.has_next_page => after = Some(cursor),
                _ => {
                    debug!(pages = page + 1, products = products.len(), "Catalog loaded");
                    return Ok(products);
                }
            }
        }

        warn!(
            max_pages = MAX_CATALOG_PAGES,
            products = products.len(),
            "Catalog truncated at page limit"
        );
        Ok(products)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Create a cart with exactly the given lines.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserErrors` if Shopify rejects any line (no
    /// partial cart is returned), `ShopifyError::MalformedResponse` if the
    /// payload lacks a cart or checkout URL, or a transport error.
    #[instrument(skip(self, lines, context), fields(line_count = lines.len()))]
    pub async fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
        context: &StoreContext,
    ) -> Result<Cart, ShopifyError> {
        let lines: Vec<serde_json::Value> = lines
            .into_iter()
            .map(|line| {
                json!({
                    "merchandiseId": line.merchandise_id.as_str(),
                    "quantity": line.quantity,
                    "attributes": line.attributes,
                })
            })
            .collect();

        let mut input = json!({ "lines": lines });
        if let Some(country) = &context.country {
            input["buyerIdentity"] = json!({ "countryCode": country });
        }

        let variables = json!({
            "input": input,
            "country": context.country,
            "language": context.language.shopify_code(),
        });

        let data: CartCreateData = self.execute(CART_CREATE_MUTATION, variables).await?;
        let payload = data
            .cart_create
            .ok_or_else(|| ShopifyError::MalformedResponse("cartCreate returned null".into()))?;

        if !payload.user_errors.is_empty() {
            return Err(ShopifyError::UserErrors(payload.user_errors));
        }

        let cart = payload
            .cart
            .ok_or_else(|| ShopifyError::MalformedResponse("cartCreate returned no cart".into()))?;

        let checkout_url = cart
            .checkout_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                ShopifyError::MalformedResponse("cart has no checkout URL".to_string())
            })?;

        Ok(Cart {
            id: CartGid::new(cart.id),
            checkout_url,
            total_quantity: cart.total_quantity,
        })
    }
}

fn convert_product(node: ProductNode) -> CatalogProduct {
    CatalogProduct {
        id: ProductGid::new(node.id),
        handle: node.handle,
        title: node.title,
        available_for_sale: node.available_for_sale,
        variants: node
            .variants
            .nodes
            .into_iter()
            .map(|v| CatalogVariant {
                id: MerchandiseId::new(v.id),
                title: v.title,
                available_for_sale: v.available_for_sale,
                selected_options: v.selected_options,
            })
            .collect(),
    }
}
