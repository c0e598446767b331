//! Domain types for Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw
//! GraphQL response shapes in `storefront::queries`.

use atelier_core::{CartGid, MerchandiseId, ProductGid};
use serde::{Deserialize, Serialize};

// =============================================================================
// Catalog Types
// =============================================================================

/// Selected option on a product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Size", "Color").
    pub name: String,
    /// Selected value (e.g., "M", "Black").
    pub value: String,
}

/// A purchasable variant as seen by the resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogVariant {
    /// Variant ID (merchandise ID for carts).
    pub id: MerchandiseId,
    /// Variant title (combination of option values, e.g. "M" or "M / Black").
    pub title: String,
    /// Whether this variant is available for sale.
    pub available_for_sale: bool,
    /// Selected options for this variant.
    pub selected_options: Vec<SelectedOption>,
}

impl CatalogVariant {
    /// Value of the option with the given name (case-insensitive).
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&str> {
        self.selected_options
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))
            .map(|o| o.value.as_str())
    }
}

/// A product with the variants needed for checkout resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    /// Product ID.
    pub id: ProductGid,
    /// URL handle.
    pub handle: String,
    /// Product title (English).
    pub title: String,
    /// Whether any variant is available.
    pub available_for_sale: bool,
    /// Variants in catalog order.
    pub variants: Vec<CatalogVariant>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Custom attribute (key-value pair) on a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: String,
}

impl Attribute {
    /// Build an attribute.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Input for a line in `cartCreate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: MerchandiseId,
    /// Quantity to add.
    pub quantity: i64,
    /// Custom attributes.
    pub attributes: Vec<Attribute>,
}

/// A cart as returned by `cartCreate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartGid,
    /// Hosted checkout URL.
    pub checkout_url: String,
    /// Total quantity across all lines.
    pub total_quantity: i64,
}

/// User error from a cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUserError {
    /// Field path that caused the error.
    pub field: Option<Vec<String>>,
    /// Error message.
    pub message: String,
    /// Error code (e.g., `INVALID`, `MERCHANDISE_NOT_FOUND`).
    pub code: Option<String>,
}
