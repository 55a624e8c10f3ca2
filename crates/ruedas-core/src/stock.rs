//! # Stock Planning
//!
//! Pure arithmetic behind every inventory movement. The database layer asks
//! these functions what a movement should look like, then writes it.
//!
//! ## Ledger Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  movement_details (append-only)          stock_levels (counter)         │
//! │  ┌──────────────────────────────┐        ┌──────────────────────┐       │
//! │  │ +10 in   inbound   0 → 10    │        │ product 7 │ qty 7    │       │
//! │  │  -2 out  sale     10 →  8    │  ───►  └──────────────────────┘       │
//! │  │  -1 out  adjust    8 →  7    │                                       │
//! │  └──────────────────────────────┘                                       │
//! │                                                                         │
//! │  derived = Σ(in) − Σ(out)   must equal   counter                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::StockDirection;
use crate::validation::{validate_id, validate_name, validate_stock_quantity, ValidationResult};

const NOTE_MAX: usize = 255;

/// A planned change to one product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChange {
    pub direction: StockDirection,
    /// Always positive; the direction carries the sign.
    pub quantity: i64,
    pub before: i64,
    pub after: i64,
}

/// Goods received.
pub fn plan_inbound(current: i64, quantity: i64) -> StockChange {
    StockChange {
        direction: StockDirection::In,
        quantity,
        before: current,
        after: StockDirection::In.apply(current, quantity),
    }
}

/// Goods leaving with a sale. Sufficiency is checked by the caller.
pub fn plan_outbound(current: i64, quantity: i64) -> StockChange {
    StockChange {
        direction: StockDirection::Out,
        quantity,
        before: current,
        after: StockDirection::Out.apply(current, quantity),
    }
}

/// Correction to a counted quantity.
///
/// Returns `Ok(None)` when the count already matches, so no movement is
/// written, and `Overflow` when the difference isn't representable.
///
/// ## Example
/// ```rust
/// use ruedas_core::stock::plan_adjustment;
/// use ruedas_core::types::StockDirection;
///
/// let change = plan_adjustment(8, 5).unwrap().unwrap();
/// assert_eq!(change.direction, StockDirection::Out);
/// assert_eq!(change.quantity, 3);
/// assert!(plan_adjustment(5, 5).unwrap().is_none());
/// assert!(plan_adjustment(i64::MIN, 1).is_err());
/// ```
pub fn plan_adjustment(current: i64, target: i64) -> ValidationResult<Option<StockChange>> {
    let delta = target
        .checked_sub(current)
        .ok_or_else(|| ValidationError::overflow("new_quantity"))?;
    let direction = match delta {
        0 => return Ok(None),
        d if d > 0 => StockDirection::In,
        _ => StockDirection::Out,
    };
    let quantity = delta
        .checked_abs()
        .ok_or_else(|| ValidationError::overflow("new_quantity"))?;

    Ok(Some(StockChange {
        direction,
        quantity,
        before: current,
        after: target,
    }))
}

#[inline]
pub fn is_sufficient(current: i64, requested: i64) -> bool {
    current >= requested
}

/// Low stock: at or below the product's minimum.
#[inline]
pub fn is_low(current: i64, stock_min: i64) -> bool {
    current <= stock_min
}

/// Current stock of one product, as read from the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockLevel {
    pub product_id: i64,
    pub product_name: String,
    pub current_stock: i64,
    pub stock_min: i64,
}

impl StockLevel {
    pub fn is_low(&self) -> bool {
        is_low(self.current_stock, self.stock_min)
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Payload for `POST /api/inventario/ajustar`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    #[serde(alias = "producto_id")]
    pub product_id: i64,
    #[serde(alias = "empleado_id")]
    pub employee_id: i64,
    /// Counted quantity. May be negative, bounded by MAX_STOCK_QUANTITY.
    #[serde(alias = "nueva_cantidad")]
    pub new_quantity: i64,
    #[serde(alias = "motivo")]
    pub reason: String,
}

impl AdjustmentRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("product_id", self.product_id)?;
        validate_id("employee_id", self.employee_id)?;
        validate_stock_quantity("new_quantity", self.new_quantity)?;
        validate_name("reason", &self.reason, NOTE_MAX)
    }
}

/// Payload for `POST /api/inventario/entrada`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRequest {
    #[serde(alias = "producto_id")]
    pub product_id: i64,
    #[serde(alias = "empleado_id")]
    pub employee_id: i64,
    #[serde(alias = "cantidad")]
    pub quantity: i64,
    #[serde(default, alias = "concepto")]
    pub concept: Option<String>,
}

impl EntryRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("product_id", self.product_id)?;
        validate_id("employee_id", self.employee_id)?;
        if self.quantity <= 0 {
            return Err(ValidationError::must_be_positive("quantity"));
        }
        validate_stock_quantity("quantity", self.quantity)?;
        if let Some(concept) = &self.concept {
            if concept.chars().count() > NOTE_MAX {
                return Err(ValidationError::TooLong {
                    field: "concept".to_string(),
                    max: NOTE_MAX,
                });
            }
        }
        Ok(())
    }
}

/// Counter vs. ledger comparison for one product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockAudit {
    pub product_id: i64,
    pub product_name: String,
    pub counter: i64,
    pub derived: i64,
    pub consistent: bool,
}

impl StockAudit {
    pub fn new(product_id: i64, product_name: String, counter: i64, derived: i64) -> Self {
        StockAudit {
            product_id,
            product_name,
            counter,
            derived,
            consistent: counter == derived,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
