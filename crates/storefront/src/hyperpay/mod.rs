//! `HyperPay` (OPPWA) payment gateway client.
//!
//! # Flow
//!
//! 1. `create_checkout` opens a session (`POST /v1/checkouts`); the browser
//!    loads the payment widget with the returned checkout ID
//! 2. The gateway redirects the shopper to `/checkout/result?id=...`
//! 3. `payment_status` asks the gateway what happened
//!    (`GET /v1/checkouts/{id}/payment`); redirect parameters are never
//!    taken as proof of payment
//!
//! Result codes are classified in [`codes`].

mod client;
pub mod codes;
pub mod types;

pub use client::HyperPayClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to `HyperPay`.
#[derive(Debug, Error)]
pub enum HyperPayError {
    /// Gateway credentials are not configured.
    #[error("payment gateway is not configured")]
    NotConfigured,

    /// HTTP request failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status without a result code.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Gateway answered with a result code that is not a success for the
    /// operation.
    #[error("gateway rejected request ({code}): {description}")]
    Rejected { code: String, description: String },

    /// Response lacks fields the operation needs.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl HyperPayError {
    /// Whether the failure happened before the gateway gave a definite answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}
