//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Configured integrations
//!
//! # Checkout
//! POST /api/checkout                    - Resolve cart, open hosted checkout
//! GET  /checkout/result                 - Payment result page (gateway redirect)
//!
//! # Card payment
//! POST /api/hyperpay                    - Open a payment widget session
//! GET  /api/hyperpay/status?id=         - Verify a payment (JSON)
//!
//! # Shipping
//! POST /api/shipping/rates              - Live or fallback shipping rates
//!
//! # Products
//! GET  /api/products/{handle}/images    - Images from the manifest
//! ```
//!
//! [`app`] wraps the routes in the middleware stack; rate limiting is
//! switched on by the binary so tests can drive the router without proxy
//! headers.

pub mod api;
pub mod checkout;
pub mod health;

use axum::{
    Router,
    http::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    api_rate_limiter, cors_layer, payment_rate_limiter, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Routes that open carts or payment sessions upstream.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/checkout", post(api::checkout::create))
        .route("/api/hyperpay", post(api::hyperpay::create))
}

/// Read-only lookups and the result page.
pub fn lookup_routes() -> Router<AppState> {
    Router::new()
        .route("/api/hyperpay/status", get(api::hyperpay::status))
        .route("/api/shipping/rates", post(api::shipping::rates))
        .route("/api/products/{handle}/images", get(api::products::images))
        .route("/checkout/result", get(checkout::result))
}

/// Health probes; never rate limited.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// The full application: routes, security headers, CORS, request IDs and
/// request tracing. Rate limits need proxy headers to key on, so they are
/// optional.
pub fn app(state: AppState, rate_limited: bool) -> Router {
    let (sessions, lookups) = if rate_limited {
        (
            session_routes().layer(payment_rate_limiter()),
            lookup_routes().layer(api_rate_limiter()),
        )
    } else {
        (session_routes(), lookup_routes())
    };

    Router::new()
        .merge(health_routes())
        .merge(sessions)
        .merge(lookups)
        .layer(from_fn_with_state(state.clone(), security_headers_middleware))
        .layer(cors_layer(&state.config().cors_origins))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<axum::body::Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use tower::ServiceExt;

    use crate::config::StorefrontConfig;
    use crate::state::AppState;

    pub const TOKEN: &str = "aB3xY9mK2nL5pQ7rT0uW4zC6dE8fG1hJ";

    /// Router over a state built from `STOREFRONT_BASE_URL` plus `extra`.
    pub fn app(extra: &[(&str, &str)]) -> Router {
        let mut vars: HashMap<String, String> = HashMap::from([(
            "STOREFRONT_BASE_URL".to_string(),
            "https://shop.atelier.sa".to_string(),
        )]);
        for (key, value) in extra {
            vars.insert((*key).to_string(), (*value).to_string());
        }
        let config = StorefrontConfig::from_map(&vars).unwrap();
        let state = AppState::new(config).unwrap();
        super::app(state, false)
    }

    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, body) = send(app, request).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }
}
