//! # Validation Module
//!
//! Input validation for request payloads.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: HTTP route (axum)                                             │
//! │  └── Type validation (JSON deserialization)                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── Required fields, ranges, formats (RFC, email)                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  ├── UNIQUE constraints (folio, username)                               │
//! │  └── Foreign keys (employee, customer, payment method)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY, MAX_STOCK_QUANTITY};

pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Rejects empty or whitespace-only values.
///
/// ## Example
/// ```rust
/// use ruedas_core::validation::validate_required;
///
/// assert!(validate_required("nombre", "Ana").is_ok());
/// assert!(validate_required("nombre", "   ").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Required text with an upper length bound.
pub fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    validate_required(field, value)?;

    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a Mexican RFC (tax id).
///
/// ## Rules
/// - 12 characters (companies) or 13 (individuals)
/// - Letters, digits and `&` only
///
/// ## Example
/// ```rust
/// use ruedas_core::validation::validate_rfc;
///
/// assert!(validate_rfc("GODE561231GR8").is_ok());
/// assert!(validate_rfc("BIC920101AB1").is_ok());
/// assert!(validate_rfc("123").is_err());
/// ```
pub fn validate_rfc(rfc: &str) -> ValidationResult<()> {
    let rfc = rfc.trim();
    validate_required("rfc", rfc)?;

    let len = rfc.chars().count();
    if !(12..=13).contains(&len) {
        return Err(ValidationError::InvalidFormat {
            field: "rfc".to_string(),
            reason: "must be 12 or 13 characters".to_string(),
        });
    }

    if !rfc.chars().all(|c| c.is_ascii_alphanumeric() || c == '&') {
        return Err(ValidationError::InvalidFormat {
            field: "rfc".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(())
}

/// Minimal shape check: `local@domain.tld`.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain.com".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a positive database id.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::must_be_positive(field));
    }
    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::must_be_positive("quantity"));
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Prices, limits and discounts in centavos: zero up to MAX_AMOUNT_CENTS.
///
/// ## Example
/// ```rust
/// use ruedas_core::validation::validate_amount_cents;
/// use ruedas_core::MAX_AMOUNT_CENTS;
///
/// assert!(validate_amount_cents("sale_price_cents", 0).is_ok());
/// assert!(validate_amount_cents("sale_price_cents", -1).is_err());
/// assert!(validate_amount_cents("sale_price_cents", MAX_AMOUNT_CENTS + 1).is_err());
/// ```
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_AMOUNT_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

/// Stock quantities named by entries and adjustments.
///
/// Negative values are accepted here; callers that need a positive
/// quantity check that first.
pub fn validate_stock_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if !(-MAX_STOCK_QUANTITY..=MAX_STOCK_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: -MAX_STOCK_QUANTITY,
            max: MAX_STOCK_QUANTITY,
        });
    }
    Ok(())
}

/// Line discount percentage, 0 to 100 inclusive.
pub fn validate_discount_percent(pct: f64) -> ValidationResult<()> {
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "discount_percent".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Llanta 700x25c", 150).is_ok());
        assert!(validate_name("name", "", 150).is_err());
        assert!(validate_name("name", &"x".repeat(151), 150).is_err());
    }

    #[test]
    fn test_validate_rfc() {
        assert!(validate_rfc("GODE561231GR8").is_ok());
        assert!(validate_rfc("  BIC920101AB1 ").is_ok());
        assert!(validate_rfc("").is_err());
        assert!(validate_rfc("GODE-561231-GR8").is_err());
        assert!(validate_rfc("SHORT").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ventas@bicis.mx").is_ok());
        assert!(validate_email("ventas@bicis").is_err());
        assert!(validate_email("@bicis.mx").is_err());
        assert!(validate_email("no-at-sign.mx").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-4).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_amount_cents_bounds() {
        assert!(validate_amount_cents("unit_price_cents", MAX_AMOUNT_CENTS).is_ok());
        assert!(validate_amount_cents("unit_price_cents", MAX_AMOUNT_CENTS + 1).is_err());
        assert!(validate_amount_cents("unit_price_cents", i64::MAX / 2 + 1).is_err());
    }

    #[test]
    fn test_validate_stock_quantity_bounds() {
        assert!(validate_stock_quantity("new_quantity", -5).is_ok());
        assert!(validate_stock_quantity("new_quantity", MAX_STOCK_QUANTITY).is_ok());
        assert!(validate_stock_quantity("new_quantity", i64::MAX).is_err());
        assert!(validate_stock_quantity("new_quantity", i64::MIN).is_err());
    }

    #[test]
    fn test_validate_discount_percent() {
        assert!(validate_discount_percent(0.0).is_ok());
        assert!(validate_discount_percent(100.0).is_ok());
        assert!(validate_discount_percent(100.5).is_err());
        assert!(validate_discount_percent(-1.0).is_err());
        assert!(validate_discount_percent(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("employee_id", 1).is_ok());
        assert!(validate_id("employee_id", 0).is_err());
    }
}
