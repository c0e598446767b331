//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (used for gateway return URLs)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_DEFAULT_CURRENCY` - Currency when the client sends none (default: SAR)
//! - `STOREFRONT_CORS_ORIGINS` - Comma-separated origins allowed to call the API
//! - `HTTP_TIMEOUT_SECS` - Timeout for every outbound request (default: 15)
//! - `IMAGE_MANIFEST_PATH` - Product image manifest (JSON)
//! - `LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Integration groups
//!
//! Each group is all-or-nothing: leaving every variable unset disables the
//! integration (its endpoints answer with a configuration error), setting only
//! some of them is a startup error.
//!
//! - Shopify: `SHOPIFY_STORE`, `SHOPIFY_STOREFRONT_PRIVATE_TOKEN`
//!   (+ `SHOPIFY_API_VERSION`, default 2026-01)
//! - `HyperPay`: `HYPERPAY_ACCESS_TOKEN`, `HYPERPAY_ENTITY_ID`
//!   (+ `HYPERPAY_BASE_URL`, default <https://eu-test.oppwa.com>; `HYPERPAY_TEST_MODE`)
//! - DHL: `DHL_API_KEY`, `DHL_API_SECRET`, `DHL_ACCOUNT_NUMBER` (+ `DHL_BASE_URL`)
//! - Aramex: `ARAMEX_USERNAME`, `ARAMEX_PASSWORD`, `ARAMEX_ACCOUNT_NUMBER`,
//!   `ARAMEX_ACCOUNT_PIN`, `ARAMEX_ACCOUNT_ENTITY` (+ `ARAMEX_BASE_URL`)
//! - Shipping origin: `SHIPPING_ORIGIN_COUNTRY` (default SA), `SHIPPING_ORIGIN_CITY` (default Riyadh)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use atelier_core::CurrencyCode;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const DEFAULT_SHOPIFY_API_VERSION: &str = "2026-01";
const DEFAULT_HYPERPAY_BASE_URL: &str = "https://eu-test.oppwa.com";
const DEFAULT_DHL_BASE_URL: &str = "https://express.api.dhl.com/mydhlapi";
const DEFAULT_ARAMEX_BASE_URL: &str = "https://ws.aramex.net/ShippingAPI.V2";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
    #[error("Incomplete {group} configuration, missing: {}", .missing.join(", "))]
    IncompleteGroup {
        group: &'static str,
        missing: Vec<String>,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Currency used when the request carries none
    pub default_currency: CurrencyCode,
    /// Origins allowed to call the JSON API from a browser
    pub cors_origins: Vec<String>,
    /// Timeout applied to every outbound HTTP request
    pub http_timeout: Duration,
    /// Shopify Storefront API configuration (catalog + cart)
    pub shopify: Option<ShopifyStorefrontConfig>,
    /// `HyperPay` gateway configuration
    pub hyperpay: Option<HyperPayConfig>,
    /// Shipping providers and origin address
    pub shipping: ShippingConfig,
    /// Product image manifest file
    pub image_manifest_path: Option<PathBuf>,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 - 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry performance traces sample rate (0.0 - 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., atelier.myshopify.com), or a full
    /// `http(s)://` origin when pointing at a proxy or mock
    pub store: String,
    /// Shopify API version (e.g., 2026-01)
    pub api_version: String,
    /// Storefront API private access token (server-side only)
    pub storefront_private_token: SecretString,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("storefront_private_token", &"[REDACTED]")
            .finish()
    }
}

impl ShopifyStorefrontConfig {
    /// GraphQL endpoint for the configured store and API version.
    #[must_use]
    pub fn graphql_endpoint(&self) -> String {
        let origin = if self.store.starts_with("http://") || self.store.starts_with("https://") {
            self.store.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.store)
        };
        format!("{origin}/api/{}/graphql.json", self.api_version)
    }
}

/// `HyperPay` (OPPWA) gateway configuration.
#[derive(Clone)]
pub struct HyperPayConfig {
    /// Gateway base URL, also handed to the browser for the payment widget
    pub base_url: String,
    /// Bearer token for the REST API
    pub access_token: SecretString,
    /// Entity (channel) ID the payments are booked on
    pub entity_id: String,
    /// `testMode` parameter for test entities (`EXTERNAL` / `INTERNAL`)
    pub test_mode: Option<String>,
}

impl std::fmt::Debug for HyperPayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperPayConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"[REDACTED]")
            .field("entity_id", &self.entity_id)
            .field("test_mode", &self.test_mode)
            .finish()
    }
}

/// Shipping configuration: where parcels leave from and who can quote them.
#[derive(Debug, Clone)]
pub struct ShippingConfig {
    /// ISO 3166-1 alpha-2 origin country
    pub origin_country: String,
    /// Origin city name
    pub origin_city: String,
    /// DHL Express credentials
    pub dhl: Option<DhlConfig>,
    /// Aramex credentials
    pub aramex: Option<AramexConfig>,
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self {
            origin_country: "SA".to_string(),
            origin_city: "Riyadh".to_string(),
            dhl: None,
            aramex: None,
        }
    }
}

/// DHL Express (`MyDHL` API) credentials.
#[derive(Clone)]
pub struct DhlConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: SecretString,
    pub account_number: String,
}

impl std::fmt::Debug for DhlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DhlConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("account_number", &self.account_number)
            .finish()
    }
}

/// Aramex shipping API credentials.
#[derive(Clone)]
pub struct AramexConfig {
    pub base_url: String,
    pub username: String,
    pub password: SecretString,
    pub account_number: String,
    pub account_pin: SecretString,
    pub account_entity: String,
    pub account_country_code: String,
}

impl std::fmt::Debug for AramexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AramexConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("account_number", &self.account_number)
            .field("account_pin", &"[REDACTED]")
            .field("account_entity", &self.account_entity)
            .field("account_country_code", &self.account_country_code)
            .finish()
    }
}

/// Source of configuration values, keyed by environment variable name.
trait Lookup {
    fn get(&self, key: &str) -> Option<String>;
}

struct ProcessEnv;

impl Lookup for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

impl Lookup for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.trim().is_empty()).cloned()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, if
    /// an integration group is only partially configured, or if a secret
    /// looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::load(&ProcessEnv)
    }

    /// Load configuration from an explicit key/value map.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::load(vars)
    }

    fn load(env: &impl Lookup) -> Result<Self, ConfigError> {
        let host = parse_env(env, "STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env(env, "STOREFRONT_PORT", "3000")?;
        let base_url = required(env, "STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;
        let default_currency = or_default(env, "STOREFRONT_DEFAULT_CURRENCY", "SAR")
            .parse::<CurrencyCode>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_DEFAULT_CURRENCY".to_string(), e.to_string())
            })?;
        let cors_origins = env
            .get("STOREFRONT_CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let http_timeout = Duration::from_secs(parse_env(env, "HTTP_TIMEOUT_SECS", "15")?);

        let log_format = match or_default(env, "LOG_FORMAT", "pretty").as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_string(),
                    format!("expected 'pretty' or 'json', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            host,
            port,
            base_url,
            default_currency,
            cors_origins,
            http_timeout,
            shopify: ShopifyStorefrontConfig::load(env)?,
            hyperpay: HyperPayConfig::load(env)?,
            shipping: ShippingConfig::load(env)?,
            image_manifest_path: env.get("IMAGE_MANIFEST_PATH").map(PathBuf::from),
            log_format,
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env(env, "SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env(env, "SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// URL the payment gateway sends the shopper back to.
    #[must_use]
    pub fn payment_result_url(&self) -> String {
        format!("{}/checkout/result", self.base_url.trim_end_matches('/'))
    }
}

impl ShopifyStorefrontConfig {
    const KEYS: &'static [&'static str] = &["SHOPIFY_STORE", "SHOPIFY_STOREFRONT_PRIVATE_TOKEN"];

    fn load(env: &impl Lookup) -> Result<Option<Self>, ConfigError> {
        if !group_enabled(env, "Shopify", Self::KEYS)? {
            return Ok(None);
        }
        Ok(Some(Self {
            store: required(env, "SHOPIFY_STORE")?,
            api_version: or_default(env, "SHOPIFY_API_VERSION", DEFAULT_SHOPIFY_API_VERSION),
            storefront_private_token: validated_token(env, "SHOPIFY_STOREFRONT_PRIVATE_TOKEN")?,
        }))
    }
}

impl HyperPayConfig {
    const KEYS: &'static [&'static str] = &["HYPERPAY_ACCESS_TOKEN", "HYPERPAY_ENTITY_ID"];

    fn load(env: &impl Lookup) -> Result<Option<Self>, ConfigError> {
        if !group_enabled(env, "HyperPay", Self::KEYS)? {
            return Ok(None);
        }
        Ok(Some(Self {
            base_url: or_default(env, "HYPERPAY_BASE_URL", DEFAULT_HYPERPAY_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            access_token: validated_token(env, "HYPERPAY_ACCESS_TOKEN")?,
            entity_id: required(env, "HYPERPAY_ENTITY_ID")?,
            test_mode: env.get("HYPERPAY_TEST_MODE"),
        }))
    }
}

impl ShippingConfig {
    const DHL_KEYS: &'static [&'static str] =
        &["DHL_API_KEY", "DHL_API_SECRET", "DHL_ACCOUNT_NUMBER"];
    const ARAMEX_KEYS: &'static [&'static str] = &[
        "ARAMEX_USERNAME",
        "ARAMEX_PASSWORD",
        "ARAMEX_ACCOUNT_NUMBER",
        "ARAMEX_ACCOUNT_PIN",
        "ARAMEX_ACCOUNT_ENTITY",
    ];

    fn load(env: &impl Lookup) -> Result<Self, ConfigError> {
        let origin_country = or_default(env, "SHIPPING_ORIGIN_COUNTRY", "SA").to_ascii_uppercase();
        if origin_country.len() != 2 || !origin_country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidEnvVar(
                "SHIPPING_ORIGIN_COUNTRY".to_string(),
                "expected an ISO 3166-1 alpha-2 code".to_string(),
            ));
        }
        let origin_city = or_default(env, "SHIPPING_ORIGIN_CITY", "Riyadh");

        let dhl = if group_enabled(env, "DHL", Self::DHL_KEYS)? {
            Some(DhlConfig {
                base_url: or_default(env, "DHL_BASE_URL", DEFAULT_DHL_BASE_URL)
                    .trim_end_matches('/')
                    .to_string(),
                api_key: required(env, "DHL_API_KEY")?,
                api_secret: non_placeholder_secret(env, "DHL_API_SECRET")?,
                account_number: required(env, "DHL_ACCOUNT_NUMBER")?,
            })
        } else {
            None
        };

        let aramex = if group_enabled(env, "Aramex", Self::ARAMEX_KEYS)? {
            Some(AramexConfig {
                base_url: or_default(env, "ARAMEX_BASE_URL", DEFAULT_ARAMEX_BASE_URL)
                    .trim_end_matches('/')
                    .to_string(),
                username: required(env, "ARAMEX_USERNAME")?,
                password: non_placeholder_secret(env, "ARAMEX_PASSWORD")?,
                account_number: required(env, "ARAMEX_ACCOUNT_NUMBER")?,
                account_pin: non_placeholder_secret(env, "ARAMEX_ACCOUNT_PIN")?,
                account_entity: required(env, "ARAMEX_ACCOUNT_ENTITY")?,
                account_country_code: origin_country.clone(),
            })
        } else {
            None
        };

        Ok(Self {
            origin_country,
            origin_city,
            dhl,
            aramex,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn required(env: &impl Lookup, key: &str) -> Result<String, ConfigError> {
    env.get(key)
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a variable with a default value.
fn or_default(env: &impl Lookup, key: &str, default: &str) -> String {
    env.get(key).unwrap_or_else(|| default.to_string())
}

/// Parse a variable (or its default) into `T`.
fn parse_env<T>(env: &impl Lookup, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    or_default(env, key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Whether an all-or-nothing group of variables is enabled.
fn group_enabled(
    env: &impl Lookup,
    group: &'static str,
    keys: &[&str],
) -> Result<bool, ConfigError> {
    let missing: Vec<String> = keys
        .iter()
        .filter(|k| env.get(k).is_none())
        .map(|k| (*k).to_string())
        .collect();

    if missing.is_empty() {
        Ok(true)
    } else if missing.len() == keys.len() {
        Ok(false)
    } else {
        Err(ConfigError::IncompleteGroup { group, missing })
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject values that look like a copy of `.env.example`.
fn reject_placeholder(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}

/// Validate that an API token is not a placeholder and has sufficient entropy.
fn validate_token_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    reject_placeholder(secret, var_name)?;

    // Real access tokens are long random strings
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the token from the provider dashboard."
            ),
        ));
    }

    Ok(())
}

/// Load and validate an API token.
fn validated_token(env: &impl Lookup, key: &str) -> Result<SecretString, ConfigError> {
    let value = required(env, key)?;
    validate_token_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// Load a password-like secret, only rejecting obvious placeholders.
fn non_placeholder_secret(env: &impl Lookup, key: &str) -> Result<SecretString, ConfigError> {
    let value = required(env, key)?;
    reject_placeholder(&value, key)?;
    Ok(SecretString::from(value))
}

/// Redacted one-line summary of which integrations are configured.
#[must_use]
pub fn summarize(config: &StorefrontConfig) -> Vec<(&'static str, String)> {
    let enabled = |on: bool| if on { "configured" } else { "not configured" }.to_string();
    vec![
        ("listen", config.socket_addr().to_string()),
        ("base_url", config.base_url.clone()),
        ("default_currency", config.default_currency.to_string()),
        ("http_timeout", format!("{}s", config.http_timeout.as_secs())),
        (
            "shopify",
            config.shopify.as_ref().map_or_else(
                || enabled(false),
                |s| format!("{} (api {})", s.store, s.api_version),
            ),
        ),
        (
            "hyperpay",
            config.hyperpay.as_ref().map_or_else(
                || enabled(false),
                |h| {
                    format!(
                        "{} entity {} (token {} chars)",
                        h.base_url,
                        h.entity_id,
                        h.access_token.expose_secret().len()
                    )
                },
            ),
        ),
        ("dhl", enabled(config.shipping.dhl.is_some())),
        ("aramex", enabled(config.shipping.aramex.is_some())),
        (
            "shipping_origin",
            format!(
                "{}, {}",
                config.shipping.origin_city, config.shipping.origin_country
            ),
        ),
        (
            "image_manifest",
            config
                .image_manifest_path
                .as_ref()
                .map_or_else(|| enabled(false), |p| p.display().to_string()),
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TOKEN: &str = "aB3xY9mK2nL5pQ7rT0uW4zC6dE8fG1hJ";

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![("STOREFRONT_BASE_URL", "https://shop.example.sa")]
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_token_strength() {
        assert!(matches!(
            validate_token_strength("your-access-token", "T"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(matches!(
            validate_token_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "T"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_token_strength(TOKEN, "T").is_ok());
    }

    #[test]
    fn test_minimal_config_disables_integrations() {
        let config = StorefrontConfig::from_map(&vars(&minimal())).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.default_currency, CurrencyCode::SAR);
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert!(config.shopify.is_none());
        assert!(config.hyperpay.is_none());
        assert!(config.shipping.dhl.is_none());
        assert!(config.shipping.aramex.is_none());
        assert_eq!(config.shipping.origin_country, "SA");
    }

    #[test]
    fn test_missing_base_url() {
        let err = StorefrontConfig::from_map(&HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(k) if k == "STOREFRONT_BASE_URL"));
    }

    #[test]
    fn test_partial_group_is_an_error() {
        let mut pairs = minimal();
        pairs.push(("HYPERPAY_ACCESS_TOKEN", TOKEN));
        let err = StorefrontConfig::from_map(&vars(&pairs)).unwrap_err();
        match err {
            ConfigError::IncompleteGroup { group, missing } => {
                assert_eq!(group, "HyperPay");
                assert_eq!(missing, vec!["HYPERPAY_ENTITY_ID".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_full_hyperpay_group() {
        let mut pairs = minimal();
        pairs.extend([
            ("HYPERPAY_ACCESS_TOKEN", TOKEN),
            ("HYPERPAY_ENTITY_ID", "8a8294174b7ecb28014b9699220015ca"),
            ("HYPERPAY_BASE_URL", "https://oppwa.com/"),
        ]);
        let config = StorefrontConfig::from_map(&vars(&pairs)).unwrap();
        let hyperpay = config.hyperpay.unwrap();
        assert_eq!(hyperpay.base_url, "https://oppwa.com");
        assert_eq!(hyperpay.access_token.expose_secret(), TOKEN);
    }

    #[test]
    fn test_invalid_log_format() {
        let mut pairs = minimal();
        pairs.push(("LOG_FORMAT", "xml"));
        assert!(matches!(
            StorefrontConfig::from_map(&vars(&pairs)),
            Err(ConfigError::InvalidEnvVar(k, _)) if k == "LOG_FORMAT"
        ));
    }

    #[test]
    fn test_graphql_endpoint() {
        let mut shopify = ShopifyStorefrontConfig {
            store: "atelier.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            storefront_private_token: SecretString::from(TOKEN),
        };
        assert_eq!(
            shopify.graphql_endpoint(),
            "https://atelier.myshopify.com/api/2026-01/graphql.json"
        );

        shopify.store = "http://127.0.0.1:9000/".to_string();
        assert_eq!(
            shopify.graphql_endpoint(),
            "http://127.0.0.1:9000/api/2026-01/graphql.json"
        );
    }

    #[test]
    fn test_payment_result_url() {
        let mut pairs = minimal();
        pairs[0] = ("STOREFRONT_BASE_URL", "https://shop.example.sa/");
        let config = StorefrontConfig::from_map(&vars(&pairs)).unwrap();
        assert_eq!(
            config.payment_result_url(),
            "https://shop.example.sa/checkout/result"
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = HyperPayConfig {
            base_url: "https://eu-test.oppwa.com".to_string(),
            access_token: SecretString::from("super_secret_access_token"),
            entity_id: "entity".to_string(),
            test_mode: None,
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_access_token"));
    }

    #[test]
    fn test_summarize_never_prints_secrets() {
        let mut pairs = minimal();
        pairs.extend([
            ("SHOPIFY_STORE", "atelier.myshopify.com"),
            ("SHOPIFY_STOREFRONT_PRIVATE_TOKEN", TOKEN),
        ]);
        let config = StorefrontConfig::from_map(&vars(&pairs)).unwrap();
        let summary = summarize(&config);
        assert!(summary.iter().all(|(_, v)| !v.contains(TOKEN)));
        assert!(
            summary
                .iter()
                .any(|(k, v)| *k == "shopify" && v.contains("atelier.myshopify.com"))
        );
    }
}
