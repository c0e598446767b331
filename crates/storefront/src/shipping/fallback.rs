//! Static shipping rates used when no live provider answers.

use atelier_core::CurrencyCode;
use rust_decimal::Decimal;

use super::{Provider, ShippingRate};

/// Gulf Cooperation Council member states.
pub const GCC_COUNTRIES: [&str; 6] = ["SA", "AE", "KW", "QA", "BH", "OM"];

/// Zone a destination falls into, relative to the shipment origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Domestic,
    Gcc,
    International,
}

impl Zone {
    #[must_use]
    pub fn for_destination(origin_country: &str, destination_country: &str) -> Self {
        if origin_country.eq_ignore_ascii_case(destination_country) {
            Self::Domestic
        } else if GCC_COUNTRIES
            .iter()
            .any(|c| c.eq_ignore_ascii_case(destination_country))
        {
            Self::Gcc
        } else {
            Self::International
        }
    }

    /// Flat rate in SAR and the quoted transit time in days.
    const fn table(self) -> (i64, u32, &'static str) {
        match self {
            Self::Domestic => (25, 3, "Standard Delivery"),
            Self::Gcc => (45, 5, "GCC Delivery"),
            Self::International => (95, 10, "International Delivery"),
        }
    }
}

/// The single fallback rate for a destination.
#[must_use]
pub fn fallback_rate(origin_country: &str, destination_country: &str) -> ShippingRate {
    let (amount, days, service) = Zone::for_destination(origin_country, destination_country).table();
    ShippingRate {
        provider: Provider::Standard,
        service: service.to_string(),
        amount: Decimal::from(amount),
        currency: CurrencyCode::SAR.code().to_string(),
        estimated_days: Some(days),
    }
}
