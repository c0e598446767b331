//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - GraphQL documents are plain strings with hand-written `serde` response types
//! - Shopify is source of truth - NO local sync, NO response cache; every
//!   checkout resolves against a fresh catalog snapshot
//! - Private access token, server-side only
//!
//! # Operations
//!
//! - `fetch_catalog` - every product with its variants (cursor-paginated)
//! - `create_cart` - `cartCreate` mutation returning the hosted checkout URL
//!
//! # Example
//!
//! ```rust,ignore
//! use atelier_storefront::shopify::StorefrontClient;
//!
//! let client = StorefrontClient::new(&config.shopify, timeout)?;
//! let catalog = client.fetch_catalog(&context).await?;
//! let cart = client.create_cart(lines, &context).await?;
//! println!("{}", cart.checkout_url);
//! ```

mod storefront;
pub mod types;

pub use storefront::StorefrontClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success status code.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response parsed but lacks a field the operation needs.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User errors from a mutation (e.g., unknown merchandise ID).
    #[error("User errors: {}", format_user_errors(.0))]
    UserErrors(Vec<CartUserError>),
}

impl ShopifyError {
    /// Whether the failure happened before Shopify gave a definite answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Status { .. } | Self::RateLimited(_)
        )
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_user_errors(errors: &[CartUserError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) if !field.is_empty() => format!("{} ({})", e.message, field.join(".")),
            _ => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Invalid ID".to_string(),
                locations: vec![],
                path: vec![],
            },
        ];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_graphql_error_empty_messages() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 5, column: 10 }],
            path: vec![
                serde_json::Value::String("cartCreate".to_string()),
                serde_json::Value::Number(0.into()),
            ],
        }];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: path: cartCreate.0 at line 5:10"
        );
    }

    #[test]
    fn test_graphql_error_empty_vec() {
        let err = ShopifyError::GraphQL(vec![]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }

    #[test]
    fn test_user_error_formatting() {
        let err = ShopifyError::UserErrors(vec![CartUserError {
            field: Some(vec![
                "input".to_string(),
                "lines".to_string(),
                "0".to_string(),
                "merchandiseId".to_string(),
            ]),
            message: "The merchandise with id gid://shopify/ProductVariant/1 does not exist."
                .to_string(),
            code: Some("INVALID".to_string()),
        }]);
        assert_eq!(
            err.to_string(),
            "User errors: The merchandise with id gid://shopify/ProductVariant/1 does not exist. (input.lines.0.merchandiseId)"
        );
    }

    #[test]
    fn test_transport_classification() {
        assert!(ShopifyError::RateLimited(2).is_transport());
        assert!(
            ShopifyError::Status {
                status: 503,
                message: String::new()
            }
            .is_transport()
        );
        assert!(!ShopifyError::UserErrors(vec![]).is_transport());
        assert!(!ShopifyError::MalformedResponse("x".to_string()).is_transport());
    }
}
