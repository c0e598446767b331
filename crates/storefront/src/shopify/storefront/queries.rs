//! GraphQL documents and raw response shapes for the Storefront API.
//!
//! Response structs mirror the selection sets below one-to-one and are
//! converted into the domain types in `shopify::types` by the client.

use serde::Deserialize;

use crate::shopify::types::{CartUserError, SelectedOption};

// =============================================================================
// Documents
// =============================================================================

/// Every product with the variant data the resolver needs.
pub const CATALOG_QUERY: &str = r"
query Catalog($first: Int!, $after: String, $country: CountryCode, $language: LanguageCode)
@inContext(country: $country, language: $language) {
  products(first: $first, after: $after) {
    pageInfo {
      hasNextPage
      endCursor
    }
    nodes {
      id
      handle
      title
      availableForSale
      variants(first: 100) {
        nodes {
          id
          title
          availableForSale
          selectedOptions {
            name
            value
          }
        }
      }
    }
  }
}
";

/// Create a cart and return its hosted checkout URL.
pub const CART_CREATE_MUTATION: &str = r"
mutation CartCreate($input: CartInput!, $country: CountryCode, $language: LanguageCode)
@inContext(country: $country, language: $language) {
  cartCreate(input: $input) {
    cart {
      id
      checkoutUrl
      totalQuantity
    }
    userErrors {
      field
      message
      code
    }
  }
}
";

// =============================================================================
// Catalog response
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CatalogData {
    pub products: ProductConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductConnection {
    pub page_info: PageInfo,
    pub nodes: Vec<ProductNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub available_for_sale: bool,
    pub variants: VariantConnection,
}

#[derive(Debug, Deserialize)]
pub struct VariantConnection {
    pub nodes: Vec<VariantNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantNode {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

// =============================================================================
// Cart response
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCreateData {
    pub cart_create: Option<CartCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCreatePayload {
    pub cart: Option<CartNode>,
    #[serde(default)]
    pub user_errors: Vec<CartUserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartNode {
    pub id: String,
    pub checkout_url: Option<String>,
    pub total_quantity: i64,
}
