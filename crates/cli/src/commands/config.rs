//! Configuration check.
//!
//! # Usage
//!
//! ```bash
//! atelier config check
//! ```
//!
//! Loads the same environment as the server (including `.env`) and prints
//! which integrations are configured. Secrets are never printed.

use atelier_storefront::config::{StorefrontConfig, summarize};
use atelier_storefront::state::AppState;

use super::CliError;

/// Validate configuration and report it.
///
/// Building the application state also validates the image manifest and
/// constructs every HTTP client, so a passing check means the server will
/// start.
///
/// # Errors
///
/// Returns the first configuration or startup error.
pub fn check() -> Result<Vec<(&'static str, String)>, CliError> {
    let config = StorefrontConfig::from_env()?;
    let summary = summarize(&config);
    AppState::new(config)?;
    Ok(summary)
}

/// Render the summary as aligned `key: value` lines.
#[must_use]
pub fn render(summary: &[(&'static str, String)]) -> String {
    let width = summary.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    summary
        .iter()
        .map(|(key, value)| format!("{key:<width$}  {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_aligns_keys() {
        let rendered = render(&[
            ("listen", "127.0.0.1:3000".to_string()),
            ("hyperpay", "not configured".to_string()),
        ]);
        assert_eq!(
            rendered,
            "listen    127.0.0.1:3000\nhyperpay  not configured"
        );
    }
}
