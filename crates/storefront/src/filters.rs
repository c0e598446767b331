//! Custom Askama template filters.

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Masks all but the last four characters of a reference.
///
/// Usage in templates: `{{ transaction_id|masked }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn masked(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(mask(&value.to_string()))
}

fn mask(value: &str) -> String {
    let count = value.chars().count();
    if count <= 4 {
        return value.to_string();
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("{}{tail}", "•".repeat(count - 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_last_four() {
        assert_eq!(mask("8ac7a4a28f1b2c3d"), "••••••••••••2c3d");
        assert_eq!(mask("abcd"), "abcd");
        assert_eq!(mask(""), "");
    }
}
