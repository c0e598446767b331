//! `HyperPay` result code classification.
//!
//! Result codes look like `000.100.110`. The gateway groups them by prefix;
//! the table below is checked top to bottom and anything it does not list is
//! a failure.

use std::sync::LazyLock;

use atelier_core::PaymentStatus;
use regex::Regex;

/// Codes returned when a checkout session was created.
pub const SESSION_CREATED_CODES: [&str; 2] = ["000.200.100", "000.200.101"];

const PATTERNS: [(&str, PaymentStatus); 4] = [
    // Successfully processed transactions
    (
        r"^(000\.000\.|000\.100\.1|000\.[36]|000\.400\.1[12]0)",
        PaymentStatus::Success,
    ),
    // Successfully processed, flagged for manual review
    (r"^(000\.400\.0[^3]|000\.400\.100)", PaymentStatus::Success),
    // Pending, may still change
    (r"^(000\.200)", PaymentStatus::Pending),
    (r"^(800\.400\.5|100\.400\.500)", PaymentStatus::Pending),
];

#[allow(clippy::expect_used)]
static TABLE: LazyLock<Vec<(Regex, PaymentStatus)>> = LazyLock::new(|| {
    PATTERNS
        .iter()
        .map(|(pattern, status)| {
            (
                Regex::new(pattern).expect("result code pattern must compile"),
                *status,
            )
        })
        .collect()
});

/// Map a result code to a payment status. Unknown codes are `Failed`.
#[must_use]
pub fn classify(code: &str) -> PaymentStatus {
    let code = code.trim();
    TABLE
        .iter()
        .find(|(pattern, _)| pattern.is_match(code))
        .map_or(PaymentStatus::Failed, |(_, status)| *status)
}

/// Whether a checkout-creation response reports a new session.
#[must_use]
pub fn is_session_created(code: &str) -> bool {
    SESSION_CREATED_CODES.contains(&code.trim())
}
