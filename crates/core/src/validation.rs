//! Client-side validation performed before any request reaches the backend API.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// A form or command failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was missing or blank.
    #[error("{field} is required")]
    MissingField {
        /// Field name as shown to the user.
        field: &'static str,
    },
    /// A field was present but unusable.
    #[error("{field} is invalid: {reason}")]
    Invalid {
        /// Field name as shown to the user.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ValidationError {
    /// Name of the offending field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } | Self::Invalid { field, .. } => field,
        }
    }
}

/// Trim a required text field, rejecting blank input.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] if the value is empty after trimming.
pub fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, mapping blank input to `None`.
#[must_use]
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Validate a URL slug: lowercase ASCII letters, digits and single hyphens.
///
/// # Errors
///
/// Returns an error if the slug is blank or contains other characters.
pub fn slug(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = required(field, value)?;
    let well_formed = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !value.starts_with('-')
        && !value.ends_with('-')
        && !value.contains("--");
    if !well_formed {
        return Err(ValidationError::Invalid {
            field,
            reason: "use lowercase letters, digits and single hyphens".to_string(),
        });
    }
    Ok(value)
}

/// Parse a required, non-negative money amount.
///
/// # Errors
///
/// Returns an error if the value is blank, not a number, or negative.
pub fn amount(field: &'static str, value: &str) -> Result<Decimal, ValidationError> {
    let value = required(field, value)?;
    parse_amount(field, &value)
}

/// Parse an optional money amount; blank input is `None`.
///
/// # Errors
///
/// Returns an error if a non-blank value is not a non-negative number.
pub fn optional_amount(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<Decimal>, ValidationError> {
    optional(value)
        .map(|value| parse_amount(field, &value))
        .transpose()
}

fn parse_amount(field: &'static str, value: &str) -> Result<Decimal, ValidationError> {
    let amount = Decimal::from_str(value.trim_start_matches('$')).map_err(|_| {
        ValidationError::Invalid {
            field,
            reason: format!("'{value}' is not a number"),
        }
    })?;
    if amount.is_sign_negative() {
        return Err(ValidationError::Invalid {
            field,
            reason: "must not be negative".to_string(),
        });
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_whitespace() {
        assert_eq!(
            required("reason", "   "),
            Err(ValidationError::MissingField { field: "reason" })
        );
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required("name", "  Tee ").as_deref(), Ok("Tee"));
    }

    #[test]
    fn test_optional_blank_is_none() {
        assert_eq!(optional(Some(" ")), None);
        assert_eq!(optional(Some(" x ")).as_deref(), Some("x"));
        assert_eq!(optional(None), None);
    }

    #[test]
    fn test_slug_rules() {
        assert!(slug("slug", "linen-shirt-2").is_ok());
        assert!(slug("slug", "Linen Shirt").is_err());
        assert!(slug("slug", "-linen").is_err());
        assert!(slug("slug", "linen--shirt").is_err());
    }

    #[test]
    fn test_error_names_field() {
        let err = ValidationError::Invalid {
            field: "price",
            reason: "must be positive".to_string(),
        };
        assert_eq!(err.field(), "price");
        assert_eq!(err.to_string(), "price is invalid: must be positive");
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!(amount("price", " 12.50 "), Ok(Decimal::new(1250, 2)));
        assert_eq!(amount("price", "$3"), Ok(Decimal::from(3)));
        assert_eq!(
            amount("price", ""),
            Err(ValidationError::MissingField { field: "price" })
        );
        assert!(amount("price", "abc").is_err());
        assert!(amount("price", "-1").is_err());
    }

    #[test]
    fn test_optional_amount_blank_is_none() {
        assert_eq!(optional_amount("sale price", Some("  ")), Ok(None));
        assert_eq!(optional_amount("sale price", None), Ok(None));
        assert_eq!(
            optional_amount("sale price", Some("9.99")),
            Ok(Some(Decimal::new(999, 2)))
        );
    }
}
