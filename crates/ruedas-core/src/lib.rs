//! # ruedas-core: Business Logic for Ruedas POS
//!
//! Everything the point of sale decides without touching the database:
//! money math, sale totals, folio generation, stock planning, validation
//! and report ranges.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ruedas POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              ruedas-api (axum HTTP + WebSocket)                 │   │
//! │  │    /api/ventas, /api/inventario, /api/reportes, /ws ...         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ruedas-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  money  │ │  sale   │ │  stock  │ │ report  │ │validate │  │   │
//! │  │   │  Money  │ │ totals  │ │  plans  │ │ ranges  │ │  rules  │  │   │
//! │  │   │ TaxRate │ │  folio  │ │  audit  │ │  rows   │ │         │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 ruedas-db (SQLite via sqlx)                     │   │
//! │  │        repositories, stock ledger, unit of work, migrations     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer centavo amounts
//! - [`types`] - Tax/discount rates and lookup enums
//! - [`entities`] - Products, customers, employees, suppliers
//! - [`sale`] - Sale requests, totals, credit terms, folios
//! - [`stock`] - Movement planning and ledger audit rows
//! - [`report`] - Report date ranges and row shapes
//! - [`validation`] - Field-level input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use ruedas_core::money::Money;
//! use ruedas_core::sale::{compute_totals, SaleItemRequest};
//! use ruedas_core::types::TaxRate;
//!
//! let items = vec![SaleItemRequest {
//!     product_id: 7,
//!     quantity: 2,
//!     unit_price_cents: 10_000,
//!     discount_percent: 10.0,
//! }];
//! let computed = compute_totals(&items, Money::zero(), TaxRate::IVA).unwrap();
//! assert_eq!(computed.totals.total_cents, 20_880); // $208.80
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod entities;
pub mod error;
pub mod money;
pub mod report;
pub mod sale;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use sale::SaleTerms;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity on a single sale line.
///
/// Catches typing 10000 instead of 10 at the register.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Largest amount accepted in any `*_cents` field: $1,000,000,000.00.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// Largest stock quantity an entry or adjustment may name, in either
/// direction.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000_000;

/// Default window of the reports when no dates are given.
pub const DEFAULT_REPORT_DAYS: i64 = 30;

/// Rows returned by the best-sellers report unless `limite` says otherwise.
pub const DEFAULT_TOP_PRODUCTS: i64 = 10;

/// Folio draws per sale before giving up.
pub const FOLIO_MAX_ATTEMPTS: u32 = 5;
