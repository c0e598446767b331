//! Cart line to catalog variant matching.
//!
//! Pure functions over a catalog snapshot; the caller fetches the snapshot.
//!
//! Product match, per line:
//! 1. title equals the requested name (trimmed, case-insensitive)
//! 2. title contains the name or the name contains the title; first in
//!    catalog order wins
//!
//! Variant match within the product:
//! 1. variant title equals the size label
//! 2. size label up to the first `/`, `-` or `|` equals the variant title or
//!    its `Size` option, whitespace ignored (`"M/15"` matches `"M"`)
//! 3. first variant available for sale
//! 4. first variant
//!
//! Lines whose product is unknown, or whose product has no variants, are
//! dropped and reported back as unmatched.

use serde::Serialize;

use crate::shopify::types::{Attribute, CartLineInput, CatalogProduct, CatalogVariant};

use super::CartLine;

/// Cart line attribute carrying the shopper's original size label.
pub const SIZE_ATTRIBUTE: &str = "Size";

const SIZE_SEPARATORS: [char; 3] = ['/', '-', '|'];

/// How a cart line's name was matched to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductMatch {
    Exact,
    Substring,
}

/// How a variant was picked within the matched product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantMatch {
    Exact,
    SizePrefix,
    FirstAvailable,
    FirstDefined,
}

/// A cart line pinned to a catalog variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLine {
    pub merchandise_id: atelier_core::MerchandiseId,
    pub quantity: u32,
    pub attributes: Vec<Attribute>,
    pub product_title: String,
    pub variant_title: String,
    pub product_match: ProductMatch,
    pub variant_match: VariantMatch,
}

impl From<ResolvedLine> for CartLineInput {
    fn from(line: ResolvedLine) -> Self {
        Self {
            merchandise_id: line.merchandise_id,
            quantity: i64::from(line.quantity),
            attributes: line.attributes,
        }
    }
}

/// Outcome of resolving a whole cart.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    /// Lines that found a variant, in input order.
    pub lines: Vec<ResolvedLine>,
    /// Display names of lines that matched no product.
    pub unmatched: Vec<String>,
}

/// Resolve every cart line against the catalog snapshot.
#[must_use]
pub fn resolve_lines(catalog: &[CatalogProduct], lines: &[CartLine]) -> Resolution {
    let mut resolution = Resolution::default();

    for line in lines {
        match resolve_line(catalog, line) {
            Some(resolved) => resolution.lines.push(resolved),
            None => resolution.unmatched.push(line.display_name.clone()),
        }
    }

    resolution
}

fn resolve_line(catalog: &[CatalogProduct], line: &CartLine) -> Option<ResolvedLine> {
    let (product, product_match) = match_product(catalog, &line.display_name)?;
    let (variant, variant_match) = match_variant(product, &line.size_label)?;

    let size = line.size_label.trim();
    let attributes = if size.is_empty() {
        Vec::new()
    } else {
        vec![Attribute::new(SIZE_ATTRIBUTE, size)]
    };

    Some(ResolvedLine {
        merchandise_id: variant.id.clone(),
        quantity: line.quantity,
        attributes,
        product_title: product.title.clone(),
        variant_title: variant.title.clone(),
        product_match,
        variant_match,
    })
}

/// Find the product for a display name.
#[must_use]
pub fn match_product<'a>(
    catalog: &'a [CatalogProduct],
    name: &str,
) -> Option<(&'a CatalogProduct, ProductMatch)> {
    let needle = normalize(name);
    if needle.is_empty() {
        return None;
    }

    if let Some(product) = catalog.iter().find(|p| normalize(&p.title) == needle) {
        return Some((product, ProductMatch::Exact));
    }

    catalog
        .iter()
        .find(|p| {
            let title = normalize(&p.title);
            !title.is_empty() && (title.contains(&needle) || needle.contains(&title))
        })
        .map(|p| (p, ProductMatch::Substring))
}

/// Pick the variant for a size label. `None` only when the product has no variants.
#[must_use]
pub fn match_variant<'a>(
    product: &'a CatalogProduct,
    size_label: &str,
) -> Option<(&'a CatalogVariant, VariantMatch)> {
    let first = product.variants.first()?;

    let size = normalize(size_label);
    if !size.is_empty() {
        if let Some(v) = product.variants.iter().find(|v| normalize(&v.title) == size) {
            return Some((v, VariantMatch::Exact));
        }

        let prefix = size_key(size.split(SIZE_SEPARATORS).next().unwrap_or_default());
        if !prefix.is_empty()
            && let Some(v) = product.variants.iter().find(|v| {
                size_key(&v.title) == prefix
                    || v.option(SIZE_ATTRIBUTE).is_some_and(|o| size_key(o) == prefix)
            })
        {
            return Some((v, VariantMatch::SizePrefix));
        }
    }

    if let Some(v) = product.variants.iter().find(|v| v.available_for_sale) {
        return Some((v, VariantMatch::FirstAvailable));
    }

    Some((first, VariantMatch::FirstDefined))
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn size_key(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
