//! Security headers middleware.
//!
//! Every response gets a locked-down policy. Pages under `/checkout` also
//! allow the payment gateway origin, which the shopper is returned from and
//! whose brand assets and widget the result page may load.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};
use url::Url;

use crate::state::AppState;

/// Path prefix of pages that talk to the payment gateway.
const CHECKOUT_PREFIX: &str = "/checkout";

/// Add security headers to all responses.
///
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: no-referrer`
/// - `Content-Security-Policy`, see [`content_security_policy`]
/// - `Permissions-Policy` denying sensitive features (`payment` allowed for
///   the gateway on checkout pages)
/// - `Cache-Control: no-store` so payment results never sit in shared caches
/// - `Cross-Origin-Opener-Policy: same-origin`
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let gateway = request
        .uri()
        .path()
        .starts_with(CHECKOUT_PREFIX)
        .then(|| {
            state
                .config()
                .hyperpay
                .as_ref()
                .and_then(|h| gateway_origin(&h.base_url))
        })
        .flatten();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    let csp = content_security_policy(gateway.as_deref());
    match HeaderValue::from_str(&csp) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => tracing::warn!(error = %e, "Invalid CSP header value"),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        if gateway.is_some() {
            HeaderValue::from_static("camera=(), geolocation=(), microphone=(), usb=(), payment=(self)")
        } else {
            HeaderValue::from_static("camera=(), geolocation=(), microphone=(), usb=(), payment=()")
        },
    );

    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

/// Build the CSP, optionally opening it to the gateway origin.
///
/// ```text
/// default-src 'none';
/// script-src 'self' [gateway];
/// style-src 'self' [gateway];
/// img-src 'self' https://cdn.shopify.com [gateway];
/// connect-src 'self' [gateway];
/// frame-src [gateway | 'none'];
/// form-action 'self' [gateway];
/// base-uri 'self';
/// object-src 'none';
/// frame-ancestors 'none'
/// ```
#[must_use]
pub fn content_security_policy(gateway: Option<&str>) -> String {
    let extra = gateway.map(|origin| format!(" {origin}")).unwrap_or_default();
    let frame = gateway.unwrap_or("'none'");
    format!(
        "default-src 'none'; \
         script-src 'self'{extra}; \
         style-src 'self'{extra}; \
         img-src 'self' https://cdn.shopify.com{extra}; \
         connect-src 'self'{extra}; \
         frame-src {frame}; \
         form-action 'self'{extra}; \
         base-uri 'self'; \
         object-src 'none'; \
         frame-ancestors 'none'"
    )
}

/// `scheme://host[:port]` of the gateway base URL.
fn gateway_origin(base_url: &str) -> Option<String> {
    let url = Url::parse(base_url).ok()?;
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
