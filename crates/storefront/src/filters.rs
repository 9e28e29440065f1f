//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Stock at or below which the product page shows a low-stock note.
const LOW_STOCK_THRESHOLD: i64 = 5;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Availability note for a stock quantity.
///
/// Usage in templates: `{{ variant_quantity|stock_label }}`
#[askama::filter_fn]
pub fn stock_label(quantity: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(stock_note(quantity.to_string().parse().unwrap_or(0)))
}

fn stock_note(quantity: i64) -> String {
    match quantity {
        q if q <= 0 => "Sold out".to_string(),
        q if q <= LOW_STOCK_THRESHOLD => format!("Only {q} left"),
        _ => "In stock".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_note() {
        assert_eq!(stock_note(-2), "Sold out");
        assert_eq!(stock_note(0), "Sold out");
        assert_eq!(stock_note(3), "Only 3 left");
        assert_eq!(stock_note(40), "In stock");
    }
}
