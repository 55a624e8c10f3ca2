//! # Domain Types
//!
//! Rates and lookup enums shared by every layer.
//!
//! ## Lookup Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Enum            │ Table            │ Rows                              │
//! │  ────────────────┼──────────────────┼────────────────────────────────── │
//! │  GeneralStatus   │ general_status   │ 1 active, 2 inactive, 3 cancelled │
//! │  SaleType        │ sale_types       │ 1 cash, 2 credit                  │
//! │  MovementKind    │ movement_types   │ 1 inbound, 2 sale, 3 adjustment   │
//! │  StockDirection  │ (column)         │ 'in' / 'out'                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The integer discriminants ARE the primary keys seeded by the initial
//! migration, so the enums decode straight from foreign-key columns.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Rates
// =============================================================================

/// Tax rate in basis points (1600 bps = 16% IVA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Mexican IVA, the default for every sale.
    pub const IVA: TaxRate = TaxRate(1600);

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// The rate as a percentage (display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::IVA
    }
}

/// Line discount in basis points (1000 bps = 10%).
///
/// Requests carry discounts as percentages (`10.0`, `12.5`); they are
/// converted once at the edge and never handled as floats afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Converts a percentage to basis points, rounding to the nearest bp.
    ///
    /// Callers validate the 0-100 range first; negative input clamps to 0.
    pub fn from_percentage(pct: f64) -> Self {
        DiscountRate((pct * 100.0).round().max(0.0) as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// General Status
// =============================================================================

/// Shared status lookup reused as the soft-delete flag of every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[repr(i32)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum GeneralStatus {
    Active = 1,
    Inactive = 2,
    /// Only sales reach this state.
    Cancelled = 3,
}

impl GeneralStatus {
    #[inline]
    pub const fn id(self) -> i64 {
        self as i64
    }
}

impl Default for GeneralStatus {
    fn default() -> Self {
        GeneralStatus::Active
    }
}

// =============================================================================
// Sale Type
// =============================================================================

/// Cash or credit sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[repr(i32)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    Cash = 1,
    Credit = 2,
}

impl SaleType {
    /// Maps a `sale_types` id to the enum.
    ///
    /// ## Example
    /// ```rust
    /// use ruedas_core::types::SaleType;
    ///
    /// assert_eq!(SaleType::from_id(2), Some(SaleType::Credit));
    /// assert_eq!(SaleType::from_id(7), None);
    /// ```
    pub const fn from_id(id: i64) -> Option<SaleType> {
        match id {
            1 => Some(SaleType::Cash),
            2 => Some(SaleType::Credit),
            _ => None,
        }
    }

    #[inline]
    pub const fn id(self) -> i64 {
        self as i64
    }
}

impl Default for SaleType {
    fn default() -> Self {
        SaleType::Cash
    }
}

// =============================================================================
// Movements
// =============================================================================

/// Why a movement was written. Classification only; the arithmetic sign
/// lives in [`StockDirection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[repr(i32)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Goods received (supplier delivery, manual entry, cancelled sale).
    Inbound = 1,
    /// Goods leaving with a sale.
    SaleOutbound = 2,
    /// Physical count correction.
    Adjustment = 3,
}

impl MovementKind {
    #[inline]
    pub const fn id(self) -> i64 {
        self as i64
    }
}

/// Sign of a movement against the stock counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StockDirection {
    In,
    Out,
}

impl StockDirection {
    /// Stock after moving `quantity` units in this direction.
    #[inline]
    pub const fn apply(self, before: i64, quantity: i64) -> i64 {
        match self {
            StockDirection::In => before + quantity,
            StockDirection::Out => before - quantity,
        }
    }

    /// +1 for inbound, -1 for outbound.
    #[inline]
    pub const fn sign(self) -> i64 {
        match self {
            StockDirection::In => 1,
            StockDirection::Out => -1,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_rate_from_percentage() {
        assert_eq!(DiscountRate::from_percentage(10.0).bps(), 1000);
        assert_eq!(DiscountRate::from_percentage(12.5).bps(), 1250);
        assert_eq!(DiscountRate::from_percentage(-3.0).bps(), 0);
    }

    #[test]
    fn test_tax_rate_default_is_iva() {
        assert_eq!(TaxRate::default().bps(), 1600);
        assert!((TaxRate::IVA.percentage() - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lookup_ids_match_seed_rows() {
        assert_eq!(GeneralStatus::Active.id(), 1);
        assert_eq!(GeneralStatus::Inactive.id(), 2);
        assert_eq!(GeneralStatus::Cancelled.id(), 3);
        assert_eq!(SaleType::Credit.id(), 2);
        assert_eq!(MovementKind::Adjustment.id(), 3);
    }

    #[test]
    fn test_direction_apply() {
        assert_eq!(StockDirection::In.apply(5, 3), 8);
        assert_eq!(StockDirection::Out.apply(5, 3), 2);
        assert_eq!(StockDirection::Out.apply(1, 3), -2);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&SaleType::Credit).unwrap(), "\"credit\"");
        assert_eq!(serde_json::to_string(&StockDirection::In).unwrap(), "\"in\"");
        assert_eq!(
            serde_json::to_string(&MovementKind::SaleOutbound).unwrap(),
            "\"sale_outbound\""
        );
    }
}
