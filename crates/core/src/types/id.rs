//! Newtype IDs for opaque upstream identifiers.
//!
//! Shopify hands out global IDs (`gid://shopify/ProductVariant/123`) and the
//! payment gateway hands out checkout IDs. Both are opaque strings to us; the
//! wrappers only stop them from being mixed up.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe wrapper around an opaque string ID.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `new()`, `as_str()`, `into_inner()`
/// - `Display` and `From<String>` / `From<&str>`
///
/// # Example
///
/// ```rust
/// # use atelier_core::define_gid;
/// define_gid!(VariantGid);
/// define_gid!(CartGid);
///
/// let variant = VariantGid::new("gid://shopify/ProductVariant/1");
/// assert_eq!(variant.as_str(), "gid://shopify/ProductVariant/1");
///
/// // These are different types, so this won't compile:
/// // let _: CartGid = variant;
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an upstream identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as sent to the upstream API.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

define_gid!(ProductGid);
define_gid!(MerchandiseId);
define_gid!(CartGid);

/// Errors when accepting a payment checkout ID from an untrusted source.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutIdError {
    /// Empty input.
    #[error("checkout id cannot be empty")]
    Empty,
    /// Longer than any ID the gateway issues.
    #[error("checkout id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Contains characters the gateway never uses.
    #[error("checkout id contains invalid characters")]
    InvalidCharacters,
    /// Would read as a relative path segment (`.`, `..`).
    #[error("checkout id must not contain dot segments")]
    DotSegment,
}

/// Payment gateway checkout (session) ID.
///
/// This value arrives in a browser redirect, so it is validated before being
/// spliced into a gateway URL path: only ASCII alphanumerics, `.` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaymentCheckoutId(String);

impl PaymentCheckoutId {
    /// Maximum accepted length.
    pub const MAX_LENGTH: usize = 64;

    /// Validate an untrusted checkout ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, contains
    /// characters outside `[A-Za-z0-9.-]`, or contains `..` or is made only
    /// of dots.
    pub fn parse(s: &str) -> Result<Self, CheckoutIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CheckoutIdError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(CheckoutIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(CheckoutIdError::InvalidCharacters);
        }
        if s.contains("..") || s.chars().all(|c| c == '.') {
            return Err(CheckoutIdError::DotSegment);
        }
        Ok(Self(s.to_owned()))
    }

    /// Borrow the ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentCheckoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PaymentCheckoutId {
    type Error = CheckoutIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PaymentCheckoutId> for String {
    fn from(id: PaymentCheckoutId) -> Self {
        id.0
    }
}
