//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Shortens long image file names for captions.
///
/// Usage in templates: `{{ image.url|file_name }}`
#[askama::filter_fn]
pub fn file_name(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(short_file_name(&value.to_string()))
}

fn short_file_name(url: &str) -> String {
    const MAX_CHARS: usize = 24;
    let name = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .rsplit('/')
        .next()
        .unwrap_or(url);
    if name.chars().count() <= MAX_CHARS {
        name.to_string()
    } else {
        let head: String = name.chars().take(MAX_CHARS - 3).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_file_name() {
        assert_eq!(short_file_name("https://bucket/variants/30/a.jpg?v=2"), "a.jpg");
        assert_eq!(short_file_name("pending.jpg"), "pending.jpg");
        assert_eq!(
            short_file_name("a-very-long-product-photo-name-final.jpg"),
            "a-very-long-product-p..."
        );
    }
}
