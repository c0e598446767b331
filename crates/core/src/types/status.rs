//! Payment outcome statuses.

use serde::{Deserialize, Serialize};

/// Externally visible outcome of a payment verification.
///
/// `Success`, `Failed` and `Error` are terminal. `Pending` only moves on
/// through an out-of-band gateway notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Gateway confirmed the payment (possibly flagged for manual review).
    Success,
    /// Awaiting settlement (cash on delivery, bank transfer, 3-D Secure in flight).
    Pending,
    /// Gateway reported a rejection, or returned a code we do not recognise.
    Failed,
    /// Verification itself could not be completed.
    Error,
}

impl PaymentStatus {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Lowercase label used in JSON and templates.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
