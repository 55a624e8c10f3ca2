//! # Error Types
//!
//! Domain-specific error types for ruedas-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ruedas-core (this file)                                                │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  ruedas-db                                                              │
//! │  └── DbError          - Database failures (wraps CoreError raised       │
//! │                         inside a transaction)                           │
//! │                                                                         │
//! │  ruedas-api                                                             │
//! │  └── ApiError         - HTTP status + JSON envelope                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → client        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more sale lines ask for more than is on hand.
    ///
    /// ## When This Occurs
    /// - Pre-check of a sale finds derived stock below the requested quantity
    /// - The guarded decrement loses a race against a concurrent sale
    ///
    /// Every failing product is listed so the cashier can fix the whole
    /// ticket at once.
    #[error("Insufficient stock for: {}", .products.join("; "))]
    InsufficientStock { products: Vec<String> },

    /// Sale type id is not one of the seeded `sale_types` rows.
    #[error("Invalid sale type: {0}")]
    InvalidSaleType(i64),

    /// Every generated folio collided with an existing sale.
    #[error("Could not generate a unique folio after {attempts} attempts")]
    FolioExhausted { attempts: u32 },

    /// Operation is not allowed in the sale's current status.
    #[error("Sale {sale_id} is {status}, cannot perform operation")]
    InvalidSaleStatus { sale_id: i64, status: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any database work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A computed amount left the representable range.
    #[error("{field} is too large")]
    Overflow { field: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }

    pub fn overflow(field: impl Into<String>) -> Self {
        ValidationError::Overflow {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
