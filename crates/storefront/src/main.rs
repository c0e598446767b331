//! Atelier Storefront - checkout and payment API.
//!
//! This binary serves the storefront SPA's API on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, JSON handlers plus one Askama page
//! - Shopify Storefront API for the catalog and hosted-checkout carts
//! - `HyperPay` for on-site card payments and their verification
//! - DHL Express and Aramex for live shipping rates
//!
//! # Security
//!
//! This binary only holds:
//! - A Shopify Storefront private token (catalog and cart scopes)
//! - `HyperPay` entity credentials
//! - Carrier rating credentials
//!
//! It keeps no database and no customer sessions.

#![cfg_attr(not(test), forbid(unsafe_code))]

use atelier_storefront::config::{LogFormat, StorefrontConfig};
use atelier_storefront::routes;
use atelier_storefront::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
#[allow(clippy::expect_used)]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "atelier_storefront=info,tower_http=info".into());

    let (pretty, json) = match config.log_format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(pretty)
        .with(json)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    for (key, value) in atelier_storefront::config::summarize(&config) {
        tracing::info!(setting = key, value = %value, "Configuration");
    }

    let addr = config.socket_addr();
    let state = AppState::new(config).expect("Failed to initialize application state");

    let app = routes::app(state, true)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
