//! Integration tests for the Atelier storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p atelier-integration-tests
//! ```
//!
//! Each test boots the real router on an ephemeral port and points Shopify,
//! `HyperPay` and the carriers at `wiremock` servers, so no credentials or
//! network access are needed.
//!
//! # Test Categories
//!
//! - `checkout_flow` - Cart resolution through payment verification
//! - `shipping_quotes` - Live carrier rates and the fallback table

use std::collections::HashMap;
use std::net::SocketAddr;

use atelier_storefront::config::StorefrontConfig;
use atelier_storefront::routes;
use atelier_storefront::state::AppState;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Shared secret used for every mocked integration.
pub const TOKEN: &str = "aB3xY9mK2nL5pQ7rT0uW4zC6dE8fG1hJ";

/// `HyperPay` entity ID used for every mocked gateway.
pub const ENTITY_ID: &str = "8a8294174b7ecb28014b9699220015ca";

/// Public origin the server believes it runs on.
pub const BASE_URL: &str = "https://shop.atelier.sa";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A storefront server running in the background of a test.
pub struct TestContext {
    pub client: reqwest::Client,
    pub addr: SocketAddr,
    server: JoinHandle<()>,
}

impl TestContext {
    /// Boot the storefront with `STOREFRONT_BASE_URL` plus `vars`.
    ///
    /// # Errors
    ///
    /// Returns an error if the variables do not form a valid configuration
    /// or the listener cannot bind.
    pub async fn spawn(vars: &[(&str, String)]) -> Result<Self, BoxError> {
        let mut env = HashMap::from([("STOREFRONT_BASE_URL".to_string(), BASE_URL.to_string())]);
        env.extend(vars.iter().map(|(k, v)| ((*k).to_string(), v.clone())));

        let config = StorefrontConfig::from_map(&env)?;
        let state = AppState::new(config)?;
        let app = routes::app(state, false);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            client: reqwest::Client::new(),
            addr,
            server,
        })
    }

    /// Absolute URL for a path on the test server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Variables pointing the Shopify client at a mock store.
#[must_use]
pub fn shopify_vars(uri: &str) -> Vec<(&'static str, String)> {
    vec![
        ("SHOPIFY_STORE", uri.to_string()),
        ("SHOPIFY_STOREFRONT_PRIVATE_TOKEN", TOKEN.to_string()),
    ]
}

/// Variables pointing the `HyperPay` client at a mock gateway.
#[must_use]
pub fn hyperpay_vars(uri: &str) -> Vec<(&'static str, String)> {
    vec![
        ("HYPERPAY_BASE_URL", uri.to_string()),
        ("HYPERPAY_ACCESS_TOKEN", TOKEN.to_string()),
        ("HYPERPAY_ENTITY_ID", ENTITY_ID.to_string()),
    ]
}
