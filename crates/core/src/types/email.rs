//! Customer email address.
//!
//! The payment gateway rejects checkouts with malformed `customer.email`
//! values, so addresses are checked before a session is requested rather than
//! round-tripping a gateway error back to the shopper.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty or only whitespace.
    #[error("email cannot be empty")]
    Empty,
    /// The input is longer than RFC 5321 allows.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not have exactly one `@`.
    #[error("email must contain exactly one @ symbol")]
    InvalidAtSymbol,
    /// The local part (before `@`) is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The domain has no dot or an empty label.
    #[error("email domain is invalid: {0}")]
    InvalidDomain(String),
}

/// A trimmed, structurally valid email address.
///
/// ```
/// use atelier_core::Email;
///
/// assert_eq!(Email::parse("  shopper@example.sa ").unwrap().as_str(), "shopper@example.sa");
/// assert!(Email::parse("shopper@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, does not
    /// have exactly one `@`, or has an empty local part or dotless domain.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let Some((local, domain)) = s.split_once('@') else {
            return Err(EmailError::InvalidAtSymbol);
        };
        if domain.contains('@') {
            return Err(EmailError::InvalidAtSymbol);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(EmailError::InvalidDomain(domain.to_string()));
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}
