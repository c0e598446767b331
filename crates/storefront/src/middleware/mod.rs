//! HTTP middleware stack for the storefront API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (storefront SPA origins)
//! 5. Security headers (CSP, frame and referrer policy)
//! 6. Rate limiting (governor, per client IP)

pub mod cors;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use cors::cors_layer;
pub use rate_limit::{api_rate_limiter, payment_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
