//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `payment_rate_limiter`: strict limits for endpoints that open carts or
//!   payment sessions upstream (~12/min)
//! - `api_rate_limiter`: relaxed limits for lookups (~100/min)

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Proxy headers carrying the real client IP, most trusted first.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-real-ip", "fly-client-ip"];

/// Key extractor that reads the client IP from Cloudflare and Fly.io proxy
/// headers, then the first `X-Forwarded-For` hop.
#[derive(Clone, Copy)]
pub struct CloudflareIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for CloudflareIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();
        let header_ip = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        };

        if let Some(ip) = header_ip(CLIENT_IP_HEADERS[0]) {
            return Ok(ip);
        }

        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        CLIENT_IP_HEADERS[1..]
            .iter()
            .find_map(|name| header_ip(name))
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<CloudflareIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for checkout and payment creation: ~12 requests per minute
/// per IP, burst of 6.
///
/// # Panics
///
/// Does not panic: `per_second(5)` and `burst_size(6)` are valid positive
/// values for `GovernorConfigBuilder`.
#[must_use]
#[allow(clippy::expect_used)]
pub fn payment_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(CloudflareIpKeyExtractor)
        .per_second(5)
        .burst_size(6)
        .finish()
        .expect("rate limiter config with per_second(5) and burst_size(6) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Rate limiter for general API: ~100 requests per minute per IP.
///
/// # Panics
///
/// Does not panic: `per_second(1)` and `burst_size(50)` are valid positive
/// values for `GovernorConfigBuilder`.
#[must_use]
#[allow(clippy::expect_used)]
pub fn api_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(CloudflareIpKeyExtractor)
        .per_second(1)
        .burst_size(50)
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(50) is valid");
    GovernorLayer::new(Arc::new(config))
}
