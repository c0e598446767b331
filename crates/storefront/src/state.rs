//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::hyperpay::{HyperPayClient, HyperPayError};
use crate::image_manifest::{ImageManifest, ManifestError};
use crate::services::{CheckoutService, PaymentService};
use crate::shipping::{ShippingError, ShippingService};
use crate::shopify::{ShopifyError, StorefrontClient};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Shopify client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("HyperPay client: {0}")]
    HyperPay(#[from] HyperPayError),
    #[error("shipping clients: {0}")]
    Shipping(#[from] ShippingError),
    #[error("image manifest: {0}")]
    Manifest(#[from] ManifestError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Every upstream client is built
/// once here and shares its connection pool across requests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    checkout: CheckoutService,
    payment: PaymentService,
    shipping: ShippingService,
    images: ImageManifest,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Unconfigured integrations are left out; their operations answer with a
    /// configuration error at request time.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the image
    /// manifest fails to load.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let timeout = config.http_timeout;

        let storefront = config
            .shopify
            .as_ref()
            .map(|c| StorefrontClient::new(c, timeout))
            .transpose()?;
        let hyperpay = config
            .hyperpay
            .as_ref()
            .map(|c| HyperPayClient::new(c, timeout))
            .transpose()?;
        let shipping = ShippingService::new(&config.shipping, timeout)?;
        let images = match &config.image_manifest_path {
            Some(path) => ImageManifest::load(path)?,
            None => ImageManifest::default(),
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                checkout: CheckoutService::new(storefront),
                payment: PaymentService::new(hyperpay, config.payment_result_url()),
                shipping,
                images,
                config,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Cart resolution and hosted checkout.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    /// `HyperPay` sessions and verification.
    #[must_use]
    pub fn payment(&self) -> &PaymentService {
        &self.inner.payment
    }

    /// Shipping rate quotes.
    #[must_use]
    pub fn shipping(&self) -> &ShippingService {
        &self.inner.shipping
    }

    /// Product image manifest.
    #[must_use]
    pub fn images(&self) -> &ImageManifest {
        &self.inner.images
    }
}
