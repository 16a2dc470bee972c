//! # Validation Module
//!
//! Input rules applied before anything is written.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor                                               │
//! │  └── Malformed JSON, wrong types → rejected with 400                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Handler (THIS MODULE)                                        │
//! │  ├── Required fields present and non-empty                             │
//! │  ├── Lengths, email shape, dates                                       │
//! │  └── Quantities and amounts in range                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Text validators return the trimmed value so callers store what was
//! checked.
//!
//! ## Usage
//! ```rust
//! use bodega_core::validation::{require_text, validate_quantity};
//!
//! let name = require_text("name", Some("  Acme  "), 100).unwrap();
//! assert_eq!(name, "Acme");
//!
//! assert!(validate_quantity(0.0).is_err());
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_TAX_ID_LEN, MAX_TEXT_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn check_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// A field that must be present and non-empty after trimming.
///
/// ## Example
/// ```rust
/// use bodega_core::validation::require_text;
///
/// assert!(require_text("sku", Some("A-1"), 100).is_ok());
/// assert!(require_text("sku", Some("   "), 100).is_err());
/// assert!(require_text("sku", None, 100).is_err());
/// ```
pub fn require_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    check_len(field, value, max)?;
    Ok(value.to_string())
}

/// A field on a partial update: absent means "leave as is", but a supplied
/// value must still be non-empty.
pub fn update_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(v) => require_text(field, Some(v), max).map(Some),
    }
}

/// A genuinely optional field. Blank input is treated as absent.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => {
            check_len(field, v, max)?;
            Ok(Some(v.to_string()))
        }
    }
}

/// Free text bounded by [`MAX_TEXT_LEN`].
pub fn require_name(field: &str, value: Option<&str>) -> ValidationResult<String> {
    require_text(field, value, MAX_TEXT_LEN)
}

/// Tax identifiers (e.g. `76123456-7`) are at most [`MAX_TAX_ID_LEN`]
/// characters.
///
/// ## Example
/// ```rust
/// use bodega_core::validation::validate_tax_id;
///
/// assert!(validate_tax_id("tax_id", Some("76123456-7")).is_ok());
/// assert!(validate_tax_id("tax_id", Some("76123456-7-0000")).is_err());
/// ```
pub fn validate_tax_id(field: &str, value: Option<&str>) -> ValidationResult<String> {
    require_text(field, value, MAX_TAX_ID_LEN)
}

/// An email needs a local part, an `@` and a domain.
pub fn validate_email(value: Option<&str>) -> ValidationResult<String> {
    let email = require_text("email", value, MAX_TEXT_LEN)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be an address like name@example.com".to_string(),
        }),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a movement quantity.
///
/// ## Rules
/// - Must be a finite number
/// - Must be greater than zero
///
/// ```rust
/// use bodega_core::validation::validate_quantity;
///
/// assert!(validate_quantity(2.5).is_ok());
/// assert!(validate_quantity(0.0).is_err());
/// assert!(validate_quantity(-1.0).is_err());
/// ```
pub fn validate_quantity(quantity: f64) -> ValidationResult<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Unit cost of a movement must be greater than zero.
pub fn validate_unit_cost(unit_cost: Money) -> ValidationResult<()> {
    if !unit_cost.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "unit_cost".to_string(),
        });
    }
    Ok(())
}

/// Monetary amounts (invoice components, cash counts, prices) may be zero
/// but never negative.
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

pub fn validate_optional_amount(field: &str, amount: Option<Money>) -> ValidationResult<()> {
    match amount {
        Some(amount) => validate_amount(field, amount),
        None => Ok(()),
    }
}

/// Contribution margin is a percentage and may not be negative.
pub fn validate_margin(margin: Option<f64>) -> ValidationResult<()> {
    match margin {
        Some(m) if !m.is_finite() || m < 0.0 => Err(ValidationError::MustBeNonNegative {
            field: "contribution_margin".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Identifiers referencing another record must be positive.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "vat_rate_bps".to_string(),
            min: 0,
            max: 10000,
        });
    }
    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parses a date or date-time.
///
/// Accepts RFC 3339 (offset applied, then dropped), `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` and a bare `YYYY-MM-DD` (midnight).
///
/// ```rust
/// use bodega_core::validation::parse_datetime;
///
/// assert!(parse_datetime("issued_at", "2020-07-27").is_ok());
/// assert!(parse_datetime("issued_at", "2020-07-27 14:30:00").is_ok());
/// assert!(parse_datetime("issued_at", "27/07/2020").is_err());
/// ```
pub fn parse_datetime(field: &str, value: &str) -> ValidationResult<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    if let Some(dt) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(dt);
    }

    Err(ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected a date like 2020-07-27 or 2020-07-27T14:30:00".to_string(),
    })
}

/// A required date field: missing, blank or unparseable input is rejected.
pub fn require_datetime(field: &str, value: Option<&str>) -> ValidationResult<NaiveDateTime> {
    match value {
        Some(v) => parse_datetime(field, v),
        None => Err(ValidationError::required(field)),
    }
}

/// Same as [`require_datetime`], interpreted as UTC.
pub fn require_timestamp(field: &str, value: Option<&str>) -> ValidationResult<DateTime<Utc>> {
    require_datetime(field, value).map(|dt| dt.and_utc())
}

/// A required value of any type.
pub fn require<T>(field: &str, value: Option<T>) -> ValidationResult<T> {
    value.ok_or_else(|| ValidationError::required(field))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("name", Some(" Acme "), 100).unwrap(), "Acme");
        assert_eq!(
            require_text("name", Some(""), 100),
            Err(ValidationError::required("name"))
        );
        assert_eq!(
            require_text("name", None, 100),
            Err(ValidationError::required("name"))
        );
        assert!(matches!(
            require_text("name", Some(&"a".repeat(101)), 100),
            Err(ValidationError::TooLong { max: 100, .. })
        ));
    }

    #[test]
    fn test_update_text() {
        assert_eq!(update_text("name", None, 100).unwrap(), None);
        assert_eq!(
            update_text("name", Some("New"), 100).unwrap(),
            Some("New".to_string())
        );
        assert!(update_text("name", Some("  "), 100).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("bank_name", Some("   "), 100).unwrap(), None);
        assert_eq!(
            optional_text("bank_name", Some("Banco Sur"), 100).unwrap(),
            Some("Banco Sur".to_string())
        );
    }

    #[test]
    fn test_validate_tax_id_length() {
        assert!(validate_tax_id("tax_id", Some("1234567890123")).is_ok());
        assert!(validate_tax_id("tax_id", Some("12345678901234")).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email(Some("ana@example.com")).is_ok());
        assert!(validate_email(Some("ana.example.com")).is_err());
        assert!(validate_email(Some("@example.com")).is_err());
        assert!(validate_email(Some("ana@")).is_err());
        assert!(validate_email(None).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1.0).is_ok());
        assert!(validate_quantity(0.25).is_ok());
        assert!(validate_quantity(0.0).is_err());
        assert!(validate_quantity(-3.0).is_err());
        assert!(validate_quantity(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_unit_cost() {
        assert!(validate_unit_cost(Money::from_minor(1)).is_ok());
        assert_eq!(
            validate_unit_cost(Money::zero()).unwrap_err().field(),
            "unit_cost"
        );
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("net_amount", Money::zero()).is_ok());
        assert!(validate_amount("net_amount", Money::from_minor(-1)).is_err());
        assert!(validate_optional_amount("unit_sale_price", None).is_ok());
    }

    #[test]
    fn test_validate_margin() {
        assert!(validate_margin(None).is_ok());
        assert!(validate_margin(Some(35.5)).is_ok());
        assert!(validate_margin(Some(-1.0)).is_err());
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2020, 7, 27)
            .and_then(|d| d.and_hms_opt(14, 30, 0))
            .unwrap();
        assert_eq!(parse_datetime("d", "2020-07-27 14:30:00").unwrap(), expected);
        assert_eq!(parse_datetime("d", "2020-07-27T14:30:00").unwrap(), expected);
        assert_eq!(parse_datetime("d", "2020-07-27T14:30:00Z").unwrap(), expected);
        assert_eq!(
            parse_datetime("d", "2020-07-27T10:30:00-04:00").unwrap(),
            expected
        );
        assert_eq!(
            parse_datetime("d", "2020-07-27").unwrap(),
            NaiveDate::from_ymd_opt(2020, 7, 27)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap()
        );
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(matches!(
            parse_datetime("issued_at", "yesterday"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert_eq!(
            require_datetime("issued_at", None),
            Err(ValidationError::required("issued_at"))
        );
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(1900).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }
}
