//! Health check endpoints.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::shipping::Provider;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Which integrations this instance can serve.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub status: &'static str,
    pub shopify: bool,
    pub hyperpay: bool,
    pub shipping_providers: Vec<Provider>,
    pub image_manifest_products: usize,
}

/// Readiness endpoint.
///
/// Upstreams are not probed; the report shows what is configured so a
/// deploy missing credentials is visible before a shopper hits it.
pub async fn readiness(State(state): State<AppState>) -> Json<Readiness> {
    let shopify = state.checkout().is_configured();
    let hyperpay = state.payment().is_configured();
    Json(Readiness {
        status: if shopify || hyperpay { "ok" } else { "degraded" },
        shopify,
        hyperpay,
        shipping_providers: state.shipping().providers(),
        image_manifest_products: state.images().len(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{TOKEN, app, get, send, send_json};

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(&[]), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_readiness_reports_integrations() {
        let (status, body) = send_json(app(&[]), get("/health/ready")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["shopify"], false);
        assert_eq!(body["shippingProviders"].as_array().unwrap().len(), 0);

        let (_, body) = send_json(
            app(&[
                ("HYPERPAY_ACCESS_TOKEN", TOKEN),
                ("HYPERPAY_ENTITY_ID", "8a8294174b7ecb28014b9699220015ca"),
            ]),
            get("/health/ready"),
        )
        .await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["hyperpay"], true);
    }
}
