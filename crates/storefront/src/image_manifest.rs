//! Product image manifest.
//!
//! A JSON file maps each product handle to its ordered images:
//!
//! ```json
//! {
//!   "linen-abaya": [
//!     { "url": "/static/products/linen-abaya/front.jpg", "alt": "Front" },
//!     { "url": "https://cdn.shopify.com/s/files/1/linen-abaya-back.jpg" }
//!   ]
//! }
//! ```
//!
//! The manifest is validated once at startup; an invalid file stops the
//! server instead of surfacing as broken images later.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or validating the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error reading {path}: {message}")]
    Io { path: String, message: String },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid handle {0:?}: expected lowercase kebab-case")]
    InvalidHandle(String),

    #[error("product {0:?} has no images")]
    EmptyImageList(String),

    #[error("product {handle:?} lists {url:?} more than once")]
    DuplicateUrl { handle: String, url: String },

    #[error("product {handle:?} has invalid image URL {url:?}: expected https:// or a /path")]
    InvalidUrl { handle: String, url: String },
}

/// One product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Validated handle → images map, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ImageManifest {
    products: Arc<HashMap<String, Vec<ProductImage>>>,
}

impl ImageManifest {
    /// Load and validate a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let manifest = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            products = manifest.len(),
            "Loaded image manifest"
        );
        Ok(manifest)
    }

    /// Parse and validate manifest JSON.
    ///
    /// # Errors
    ///
    /// Returns the first parse or validation error.
    pub fn from_json(raw: &str) -> Result<Self, ManifestError> {
        let products: HashMap<String, Vec<ProductImage>> = serde_json::from_str(raw)?;

        // Sorted so the reported error does not depend on hash order
        let mut handles: Vec<&String> = products.keys().collect();
        handles.sort();

        for handle in handles {
            if !is_kebab_case(handle) {
                return Err(ManifestError::InvalidHandle(handle.clone()));
            }
            validate_images(handle, &products[handle])?;
        }

        Ok(Self {
            products: Arc::new(products),
        })
    }

    /// Images for a product handle, in display order.
    #[must_use]
    pub fn images(&self, handle: &str) -> Option<&[ProductImage]> {
        self.products.get(handle).map(Vec::as_slice)
    }

    /// Number of products in the manifest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

fn validate_images(handle: &str, images: &[ProductImage]) -> Result<(), ManifestError> {
    if images.is_empty() {
        return Err(ManifestError::EmptyImageList(handle.to_string()));
    }

    let mut seen = HashSet::new();
    for image in images {
        let url = image.url.trim();
        let valid = (url.starts_with("https://") && url.len() > "https://".len())
            || (url.starts_with('/') && !url.starts_with("//") && url.len() > 1);
        if !valid {
            return Err(ManifestError::InvalidUrl {
                handle: handle.to_string(),
                url: image.url.clone(),
            });
        }
        if !seen.insert(url) {
            return Err(ManifestError::DuplicateUrl {
                handle: handle.to_string(),
                url: image.url.clone(),
            });
        }
    }
    Ok(())
}

/// `linen-abaya`, `pants-7777`; no leading, trailing or doubled hyphens.
fn is_kebab_case(handle: &str) -> bool {
    !handle.is_empty()
        && handle
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_manifest() {
        let manifest = ImageManifest::from_json(
            r#"{
                "linen-abaya": [
                    { "url": "/static/products/linen-abaya/front.jpg", "alt": "Front" },
                    { "url": "https://cdn.shopify.com/s/files/1/back.jpg" }
                ],
                "pants-7777": [{ "url": "/static/products/pants-7777.jpg" }]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.len(), 2);
        let images = manifest.images("linen-abaya").unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].alt.as_deref(), Some("Front"));
        assert!(manifest.images("silk-scarf").is_none());
    }

    #[test]
    fn test_rejects_bad_handles() {
        for handle in ["Linen-Abaya", "linen_abaya", "-linen", "linen--abaya", "linen-", ""] {
            let raw = format!(r#"{{ "{handle}": [{{ "url": "/a.jpg" }}] }}"#);
            assert!(
                matches!(
                    ImageManifest::from_json(&raw),
                    Err(ManifestError::InvalidHandle(_))
                ),
                "{handle:?}"
            );
        }
    }

    #[test]
    fn test_rejects_empty_list() {
        assert!(matches!(
            ImageManifest::from_json(r#"{ "linen-abaya": [] }"#),
            Err(ManifestError::EmptyImageList(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_urls() {
        assert!(matches!(
            ImageManifest::from_json(
                r#"{ "linen-abaya": [{ "url": "/a.jpg" }, { "url": "/a.jpg", "alt": "again" }] }"#
            ),
            Err(ManifestError::DuplicateUrl { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_urls() {
        for url in ["http://cdn.example.com/a.jpg", "images/a.jpg", "//cdn.example.com/a.jpg", "/", "https://"] {
            let raw = format!(r#"{{ "linen-abaya": [{{ "url": "{url}" }}] }}"#);
            assert!(
                matches!(
                    ImageManifest::from_json(&raw),
                    Err(ManifestError::InvalidUrl { .. })
                ),
                "{url:?}"
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let err = ImageManifest::load(Path::new("/nonexistent/manifest.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }
}
