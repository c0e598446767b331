//! Type-safe price representation using decimal arithmetic.
//!
//! Payment gateways in the region take amounts in major currency units with
//! exactly two fractional digits (`"149.00"`), so [`Price`] refuses anything
//! finer than a hundredth at construction time instead of rounding silently.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Amount is zero or negative.
    #[error("amount must be greater than zero (got {0})")]
    NotPositive(Decimal),
    /// Amount has more than two fractional digits.
    #[error("amount must have at most two decimal places (got {0})")]
    TooPrecise(Decimal),
    /// Currency code is not one we sell in.
    #[error("unsupported currency code: {0}")]
    UnknownCurrency(String),
}

/// A positive price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's major unit (riyals, not halalas).
    amount: Decimal,
    /// ISO 4217 currency code.
    currency_code: CurrencyCode,
}

impl Price {
    /// Maximum number of fractional digits accepted.
    pub const MAX_SCALE: u32 = 2;

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive or has more than two
    /// fractional digits.
    pub fn new(amount: Decimal, currency_code: CurrencyCode) -> Result<Self, PriceError> {
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive(amount));
        }
        if amount.normalize().scale() > Self::MAX_SCALE {
            return Err(PriceError::TooPrecise(amount));
        }
        Ok(Self {
            amount,
            currency_code,
        })
    }

    /// The amount in major units.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// The currency of this price.
    #[must_use]
    pub const fn currency_code(&self) -> CurrencyCode {
        self.currency_code
    }

    /// Amount formatted with exactly two decimals and a dot separator.
    #[must_use]
    pub fn gateway_amount(&self) -> String {
        format!("{:.2}", self.amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.gateway_amount(), self.currency_code)
    }
}

/// ISO 4217 currency codes accepted by the storefront.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    SAR,
    AED,
    KWD,
    QAR,
    BHD,
    OMR,
    EGP,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Three-letter code as sent to upstream APIs.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SAR => "SAR",
            Self::AED => "AED",
            Self::KWD => "KWD",
            Self::QAR => "QAR",
            Self::BHD => "BHD",
            Self::OMR => "OMR",
            Self::EGP => "EGP",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SAR" => Ok(Self::SAR),
            "AED" => Ok(Self::AED),
            "KWD" => Ok(Self::KWD),
            "QAR" => Ok(Self::QAR),
            "BHD" => Ok(Self::BHD),
            "OMR" => Ok(Self::OMR),
            "EGP" => Ok(Self::EGP),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            _ => Err(PriceError::UnknownCurrency(s.to_string())),
        }
    }
}
