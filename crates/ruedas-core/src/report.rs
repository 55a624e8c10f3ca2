//! # Reports
//!
//! Date-range resolution and the row shapes of the read-only reports.
//! Only active (non-cancelled) sales are aggregated.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::ValidationResult;
use crate::DEFAULT_REPORT_DAYS;

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive calendar-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds the range from `fecha_inicio` / `fecha_fin` query strings.
    ///
    /// Both bounds given: parsed as `YYYY-MM-DD`. Either one missing: the
    /// last 30 days ending `today`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use ruedas_core::report::DateRange;
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
    /// let range = DateRange::resolve(None, None, today).unwrap();
    /// assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    /// assert_eq!(range.end, today);
    /// ```
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> ValidationResult<DateRange> {
        Ok(DateRange::parse_optional(start, end)?
            .unwrap_or_else(|| DateRange::last_days(today, DEFAULT_REPORT_DAYS)))
    }

    /// Both bounds or nothing: used by listings that show everything when
    /// no range is given.
    pub fn parse_optional(
        start: Option<&str>,
        end: Option<&str>,
    ) -> ValidationResult<Option<DateRange>> {
        match (start, end) {
            (Some(start), Some(end)) => {
                let range = DateRange {
                    start: parse_date("fecha_inicio", start)?,
                    end: parse_date("fecha_fin", end)?,
                };
                if range.start > range.end {
                    return Err(ValidationError::InvalidFormat {
                        field: "fecha_inicio".to_string(),
                        reason: "must not be after fecha_fin".to_string(),
                    });
                }
                Ok(Some(range))
            }
            _ => Ok(None),
        }
    }

    /// From `today - days` through `today`, both ends inclusive, so the
    /// range spans `days + 1` calendar days.
    pub fn last_days(today: NaiveDate, days: i64) -> DateRange {
        DateRange {
            start: today - Duration::days(days),
            end: today,
        }
    }

    /// Bounds as `YYYY-MM-DD` strings for SQL comparison.
    pub fn bounds(&self) -> (String, String) {
        (
            self.start.format("%Y-%m-%d").to_string(),
            self.end.format("%Y-%m-%d").to_string(),
        )
    }
}

fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })
}

// =============================================================================
// Report Rows
// =============================================================================

/// `GET /api/reportes/ventas/periodo`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PeriodSummary {
    pub sale_count: i64,
    pub revenue_cents: i64,
    pub average_ticket_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub cash_count: i64,
    pub cash_revenue_cents: i64,
    pub credit_count: i64,
    pub credit_revenue_cents: i64,
}

/// `GET /api/reportes/productos/mas-vendidos`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TopProduct {
    pub product_id: i64,
    pub name: String,
    pub barcode: Option<String>,
    pub units_sold: i64,
    pub revenue_cents: i64,
    pub sale_count: i64,
}

/// `GET /api/reportes/ventas/empleados`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct EmployeeSales {
    pub employee_id: i64,
    pub employee_name: String,
    pub sale_count: i64,
    pub revenue_cents: i64,
    pub average_ticket_cents: i64,
}

/// `GET /api/reportes/ventas/metodos-pago`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentMethodSales {
    pub payment_method_id: i64,
    pub payment_method_name: String,
    pub sale_count: i64,
    pub revenue_cents: i64,
}

/// `GET /api/reportes/inventario/estadisticas`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryStats {
    pub total_products: i64,
    pub active_products: i64,
    pub low_stock_products: i64,
    /// Σ stock × sale price over active products.
    pub inventory_value_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
