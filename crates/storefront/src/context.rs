//! Per-request store context (currency, language, country).
//!
//! Handlers receive the shopper's storefront settings as an explicit value
//! instead of reading them from ambient state, so the checkout services can be
//! called (and tested) with any context.
//!
//! # Headers
//!
//! - `x-store-currency` - ISO 4217 code; unknown values fall back to the configured default
//! - `x-store-country` - ISO 3166-1 alpha-2 code; ignored when malformed
//! - `accept-language` - first tag decides between English and Arabic

use std::convert::Infallible;

use atelier_core::CurrencyCode;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::ACCEPT_LANGUAGE, request::Parts},
};
use serde::Serialize;

use crate::state::AppState;

/// Header carrying the shopper's selected currency.
pub const CURRENCY_HEADER: &str = "x-store-currency";

/// Header carrying the shopper's country.
pub const COUNTRY_HEADER: &str = "x-store-country";

/// Storefront languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    /// `LanguageCode` enum value in the Storefront API.
    #[must_use]
    pub const fn shopify_code(self) -> &'static str {
        match self {
            Self::En => "EN",
            Self::Ar => "AR",
        }
    }

    /// Parse the first tag of an `Accept-Language` header.
    #[must_use]
    pub fn from_accept_language(value: &str) -> Self {
        let first = value
            .split(',')
            .next()
            .and_then(|tag| tag.split(';').next())
            .unwrap_or("")
            .trim();
        let primary = first.split('-').next().unwrap_or("");
        if primary.eq_ignore_ascii_case("ar") {
            Self::Ar
        } else {
            Self::En
        }
    }
}

/// The shopper's storefront settings for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreContext {
    pub currency: CurrencyCode,
    pub language: Language,
    /// ISO 3166-1 alpha-2, uppercase.
    pub country: Option<String>,
}

impl StoreContext {
    /// Context with the given default currency and nothing else known.
    #[must_use]
    pub const fn with_currency(currency: CurrencyCode) -> Self {
        Self {
            currency,
            language: Language::En,
            country: None,
        }
    }

    /// Build a context from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, default_currency: CurrencyCode) -> Self {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        let currency = header(CURRENCY_HEADER)
            .and_then(|v| v.parse::<CurrencyCode>().ok())
            .unwrap_or(default_currency);
        let language = headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(Language::from_accept_language)
            .unwrap_or_default();
        let country = header(COUNTRY_HEADER).and_then(normalize_country);

        Self {
            currency,
            language,
            country,
        }
    }
}

/// Uppercase a two-letter country code, rejecting anything else.
#[must_use]
pub fn normalize_country(value: &str) -> Option<String> {
    let value = value.trim();
    (value.len() == 2 && value.chars().all(|c| c.is_ascii_alphabetic()))
        .then(|| value.to_ascii_uppercase())
}

impl FromRequestParts<AppState> for StoreContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(
            &parts.headers,
            state.config().default_currency,
        ))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_defaults_when_no_headers() {
        let ctx = StoreContext::from_headers(&HeaderMap::new(), CurrencyCode::SAR);
        assert_eq!(ctx, StoreContext::with_currency(CurrencyCode::SAR));
    }

    #[test]
    fn test_reads_all_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CURRENCY_HEADER, HeaderValue::from_static("aed"));
        headers.insert(COUNTRY_HEADER, HeaderValue::from_static("ae"));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ar-SA,ar;q=0.9,en;q=0.8"),
        );

        let ctx = StoreContext::from_headers(&headers, CurrencyCode::SAR);
        assert_eq!(ctx.currency, CurrencyCode::AED);
        assert_eq!(ctx.country.as_deref(), Some("AE"));
        assert_eq!(ctx.language, Language::Ar);
    }

    #[test]
    fn test_unknown_currency_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert(CURRENCY_HEADER, HeaderValue::from_static("BTC"));
        headers.insert(COUNTRY_HEADER, HeaderValue::from_static("Saudi"));

        let ctx = StoreContext::from_headers(&headers, CurrencyCode::KWD);
        assert_eq!(ctx.currency, CurrencyCode::KWD);
        assert_eq!(ctx.country, None);
    }

    #[test]
    fn test_accept_language_parsing() {
        assert_eq!(Language::from_accept_language("en-US,en;q=0.9"), Language::En);
        assert_eq!(Language::from_accept_language("AR"), Language::Ar);
        assert_eq!(Language::from_accept_language("fr-FR"), Language::En);
        assert_eq!(Language::from_accept_language(""), Language::En);
    }
}
