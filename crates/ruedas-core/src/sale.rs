//! # Sale Math
//!
//! Everything about a sale that can be decided without the database:
//! request validation, line and ticket totals, credit terms, and folios.
//!
//! ## Sale Computation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleRequest                                                            │
//! │   items: [{product 7, qty 2, $100.00, 10%}]                              │
//! │   general_discount: $0.00                                               │
//! │       │                                                                 │
//! │       ▼ validate()                                                      │
//! │  compute_totals(items, general_discount, terms.tax_rate)                │
//! │       │                                                                 │
//! │       │   line gross   = 2 × $100.00          = $200.00                 │
//! │       │   line net     = $200.00 − 10%        = $180.00                 │
//! │       │   subtotal     = Σ line net           = $180.00                 │
//! │       │   tax          = $180.00 × 16%        =  $28.80                 │
//! │       │   total        = $180.00 + $28.80 − 0 = $208.80                 │
//! │       ▼                                                                 │
//! │  credit_terms(sale_type, total, down_payment, sold_at, term_days)       │
//! │       │   cash   → pending $0, no due date                              │
//! │       │   credit → pending total − down payment, due sold_at + 30d      │
//! │       ▼                                                                 │
//! │  generate_folio(rng) → "VTA-QZK-0831"                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are computed once, when the sale is created, and never recomputed.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{DiscountRate, GeneralStatus, SaleType, TaxRate};
use crate::validation::{
    validate_amount_cents, validate_discount_percent, validate_id, validate_quantity,
};

// =============================================================================
// Terms
// =============================================================================

/// Business constants of a sale, injected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTerms {
    pub tax_rate: TaxRate,
    /// Days until a credit sale's receivable is due.
    pub credit_term_days: i64,
}

impl Default for SaleTerms {
    /// 16% IVA and a 30-day credit term.
    fn default() -> Self {
        SaleTerms {
            tax_rate: TaxRate::IVA,
            credit_term_days: 30,
        }
    }
}

// =============================================================================
// Request
// =============================================================================

/// One line of a sale request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItemRequest {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Line discount as a percentage (10.0 = 10%).
    #[serde(default)]
    pub discount_percent: f64,
}

/// Payload for `POST /api/ventas`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRequest {
    /// Optional for cash sales; credit sales without a customer get no
    /// receivable.
    #[serde(default)]
    pub customer_id: Option<i64>,
    pub employee_id: i64,
    pub payment_method_id: i64,
    /// 1 = cash, 2 = credit.
    #[serde(default = "default_sale_type_id")]
    pub sale_type_id: i64,
    pub items: Vec<SaleItemRequest>,
    #[serde(default)]
    pub general_discount_cents: i64,
    #[serde(default)]
    pub down_payment_cents: i64,
    #[serde(default)]
    pub cash_received_cents: Option<i64>,
    #[serde(default)]
    pub change_cents: Option<i64>,
}

fn default_sale_type_id() -> i64 {
    SaleType::Cash.id()
}

impl SaleRequest {
    /// Checks the request shape and resolves the sale type.
    ///
    /// ## Rules
    /// - At least one line
    /// - Every line: product id > 0, quantity in range, price ≥ 0,
    ///   discount 0-100%
    /// - General discount, down payment and cash amounts ≥ 0
    /// - Sale type must be cash (1) or credit (2)
    pub fn validate(&self) -> CoreResult<SaleType> {
        validate_id("employee_id", self.employee_id)?;
        validate_id("payment_method_id", self.payment_method_id)?;
        if let Some(customer_id) = self.customer_id {
            validate_id("customer_id", customer_id)?;
        }

        if self.items.is_empty() {
            return Err(ValidationError::required("items").into());
        }

        for item in &self.items {
            validate_id("product_id", item.product_id)?;
            validate_quantity(item.quantity)?;
            validate_amount_cents("unit_price_cents", item.unit_price_cents)?;
            validate_discount_percent(item.discount_percent)?;
        }

        validate_amount_cents("general_discount_cents", self.general_discount_cents)?;
        validate_amount_cents("down_payment_cents", self.down_payment_cents)?;
        if let Some(cents) = self.cash_received_cents {
            validate_amount_cents("cash_received_cents", cents)?;
        }
        if let Some(cents) = self.change_cents {
            validate_amount_cents("change_cents", cents)?;
        }

        SaleType::from_id(self.sale_type_id).ok_or(CoreError::InvalidSaleType(self.sale_type_id))
    }

    /// Total requested per product, in first-appearance order.
    ///
    /// A product listed on two lines must have stock for both together.
    pub fn requested_quantities(&self) -> Vec<(i64, i64)> {
        let mut totals: Vec<(i64, i64)> = Vec::new();
        for item in &self.items {
            match totals.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, qty)) => *qty += item.quantity,
                None => totals.push((item.product_id, item.quantity)),
            }
        }
        totals
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Amounts of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmount {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: DiscountRate,
    /// quantity × unit price × (1 − discount).
    pub line_total: Money,
}

/// Header amounts of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    /// General (ticket-level) discount.
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl SaleTotals {
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Result of pricing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleComputation {
    pub lines: Vec<LineAmount>,
    pub totals: SaleTotals,
}

/// Net amount of one line. `None` when quantity × price overflows.
///
/// ## Example
/// ```rust
/// use ruedas_core::money::Money;
/// use ruedas_core::sale::line_total;
/// use ruedas_core::types::DiscountRate;
///
/// let total = line_total(Money::from_cents(10_000), 2, DiscountRate::from_bps(1000));
/// assert_eq!(total, Some(Money::from_cents(18_000)));
/// ```
pub fn line_total(unit_price: Money, quantity: i64, discount: DiscountRate) -> Option<Money> {
    unit_price
        .checked_multiply_quantity(quantity)
        .map(|gross| gross.apply_discount(discount))
}

/// Prices every line and the sale header.
///
/// The general discount is subtracted after tax, so a large enough
/// discount can drive the total below zero. Nothing clamps it.
///
/// ## Errors
/// `ValidationError::Overflow` when a line, the subtotal or the total
/// leaves the i64 range.
pub fn compute_totals(
    items: &[SaleItemRequest],
    general_discount: Money,
    tax_rate: TaxRate,
) -> CoreResult<SaleComputation> {
    let mut lines = Vec::with_capacity(items.len());
    let mut subtotal = Money::zero();

    for item in items {
        let unit_price = Money::from_cents(item.unit_price_cents);
        let discount = DiscountRate::from_percentage(item.discount_percent);
        let net = line_total(unit_price, item.quantity, discount)
            .ok_or_else(|| ValidationError::overflow("line_total"))?;

        subtotal = subtotal
            .checked_add(net)
            .ok_or_else(|| ValidationError::overflow("subtotal"))?;

        lines.push(LineAmount {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price,
            discount,
            line_total: net,
        });
    }

    let tax = subtotal.calculate_tax(tax_rate);
    let total = subtotal
        .checked_add(tax)
        .and_then(|gross| gross.checked_sub(general_discount))
        .ok_or_else(|| ValidationError::overflow("total"))?;

    Ok(SaleComputation {
        lines,
        totals: SaleTotals {
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            discount_cents: general_discount.cents(),
            total_cents: total.cents(),
        },
    })
}

// =============================================================================
// Credit Terms
// =============================================================================

/// Balance and due date derived from the sale type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditTerms {
    pub pending_balance: Money,
    pub due_date: Option<DateTime<Utc>>,
}

/// Credit: pending = total − down payment, due after `term_days`.
/// Cash: nothing pending, no due date.
pub fn credit_terms(
    sale_type: SaleType,
    total: Money,
    down_payment: Money,
    sold_at: DateTime<Utc>,
    term_days: i64,
) -> CoreResult<CreditTerms> {
    match sale_type {
        SaleType::Credit => {
            let pending_balance = total
                .checked_sub(down_payment)
                .ok_or_else(|| ValidationError::overflow("pending_balance"))?;
            let due_date = Duration::try_days(term_days)
                .and_then(|term| sold_at.checked_add_signed(term))
                .ok_or_else(|| ValidationError::overflow("credit_due_date"))?;

            Ok(CreditTerms {
                pending_balance,
                due_date: Some(due_date),
            })
        }
        SaleType::Cash => Ok(CreditTerms {
            pending_balance: Money::zero(),
            due_date: None,
        }),
    }
}

// =============================================================================
// Folio
// =============================================================================

/// Generates a folio: `VTA-` + 3 uppercase letters + `-` + 4 digits.
///
/// ~175.8M combinations. Uniqueness is enforced by the caller against the
/// `sales.folio` index, not here.
pub fn generate_folio<R: Rng + ?Sized>(rng: &mut R) -> String {
    let letters: String = (0..3)
        .map(|_| char::from(b'A' + rng.gen_range(0..26u8)))
        .collect();
    let digits: u32 = rng.gen_range(0..10_000);
    format!("VTA-{}-{:04}", letters, digits)
}

/// Whether `folio` has the `VTA-ABC-1234` shape.
pub fn is_valid_folio(folio: &str) -> bool {
    let parts: Vec<&str> = folio.split('-').collect();
    matches!(
        parts.as_slice(),
        ["VTA", letters, digits]
            if letters.len() == 3
                && letters.chars().all(|c| c.is_ascii_uppercase())
                && digits.len() == 4
                && digits.chars().all(|c| c.is_ascii_digit())
    )
}

// =============================================================================
// Results
// =============================================================================

/// Returned by a successful sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleReceipt {
    pub sale_id: i64,
    pub folio: String,
    pub totals: SaleTotals,
    pub pending_balance_cents: i64,
    #[ts(as = "Option<String>")]
    pub credit_due_date: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
}

/// A sale header joined with customer, employee and lookup names.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    pub folio: String,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub credit_due_date: Option<DateTime<Utc>>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub down_payment_cents: i64,
    pub pending_balance_cents: i64,
    pub cash_received_cents: Option<i64>,
    pub change_cents: Option<i64>,
    pub sale_type: SaleType,
    pub sale_type_name: String,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub employee_id: i64,
    pub employee_name: String,
    pub payment_method_id: i64,
    pub payment_method_name: String,
    pub status: GeneralStatus,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// A stored sale line, joined with the product's name and barcode.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLine {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub barcode: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_bps: i64,
    pub line_total_cents: i64,
}

/// Sale header plus its lines (`GET /api/ventas/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn item(product_id: i64, quantity: i64, unit_price_cents: i64, discount: f64) -> SaleItemRequest {
        SaleItemRequest {
            product_id,
            quantity,
            unit_price_cents,
            discount_percent: discount,
        }
    }

    fn request(items: Vec<SaleItemRequest>) -> SaleRequest {
        SaleRequest {
            customer_id: None,
            employee_id: 1,
            payment_method_id: 1,
            sale_type_id: 1,
            items,
            general_discount_cents: 0,
            down_payment_cents: 0,
            cash_received_cents: None,
            change_cents: None,
        }
    }

    #[test]
    fn test_two_units_ten_percent_off() {
        let computed = compute_totals(&[item(7, 2, 10_000, 10.0)], Money::zero(), TaxRate::IVA).unwrap();
        assert_eq!(computed.lines[0].line_total.cents(), 18_000);
        assert_eq!(computed.totals.subtotal_cents, 18_000);
        assert_eq!(computed.totals.tax_cents, 2_880);
        assert_eq!(computed.totals.total_cents, 20_880);
    }

    #[test]
    fn test_general_discount_applies_after_tax() {
        let computed = compute_totals(
            &[item(1, 1, 10_000, 0.0), item(2, 3, 2_500, 0.0)],
            Money::from_cents(1_000),
            TaxRate::IVA,
        )
        .unwrap();
        // subtotal 175.00, tax 28.00, total 175 + 28 - 10 = 193.00
        assert_eq!(computed.totals.subtotal_cents, 17_500);
        assert_eq!(computed.totals.tax_cents, 2_800);
        assert_eq!(computed.totals.discount_cents, 1_000);
        assert_eq!(computed.totals.total_cents, 19_300);
    }

    #[test]
    fn test_validate_rejects_empty_and_bad_lines() {
        assert!(request(vec![]).validate().is_err());
        assert!(request(vec![item(1, 0, 100, 0.0)]).validate().is_err());
        assert!(request(vec![item(1, 1, -5, 0.0)]).validate().is_err());
        assert!(request(vec![item(1, 1, 100, 120.0)]).validate().is_err());
    }

    #[test]
    fn test_validate_resolves_sale_type() {
        let mut req = request(vec![item(1, 1, 100, 0.0)]);
        assert_eq!(req.validate().unwrap(), SaleType::Cash);

        req.sale_type_id = 2;
        assert_eq!(req.validate().unwrap(), SaleType::Credit);

        req.sale_type_id = 9;
        assert!(matches!(req.validate(), Err(CoreError::InvalidSaleType(9))));
    }

    #[test]
    fn test_requested_quantities_merges_lines() {
        let req = request(vec![
            item(5, 1, 100, 0.0),
            item(3, 2, 100, 0.0),
            item(5, 4, 90, 0.0),
        ]);
        assert_eq!(req.requested_quantities(), vec![(5, 5), (3, 2)]);
    }

    #[test]
    fn test_credit_terms() {
        let sold_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let terms = credit_terms(
            SaleType::Credit,
            Money::from_cents(20_880),
            Money::from_cents(5_000),
            sold_at,
            30,
        )
        .unwrap();
        assert_eq!(terms.pending_balance.cents(), 15_880);
        assert_eq!(
            terms.due_date,
            Some(Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap())
        );

        let cash = credit_terms(SaleType::Cash, Money::from_cents(20_880), Money::zero(), sold_at, 30).unwrap();
        assert!(cash.pending_balance.is_zero());
        assert!(cash.due_date.is_none());
    }

    #[test]
    fn test_credit_terms_reject_unrepresentable_due_date() {
        let sold_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let result = credit_terms(SaleType::Credit, Money::zero(), Money::zero(), sold_at, i64::MAX);
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::Overflow { .. }))
        ));
    }

    #[test]
    fn test_oversized_price_is_rejected_before_pricing() {
        let req = request(vec![item(1, 2, i64::MAX / 2 + 1, 0.0)]);
        assert!(matches!(
            req.validate(),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_totals_overflow_is_an_error() {
        let line = compute_totals(&[item(1, 2, i64::MAX / 2 + 1, 0.0)], Money::zero(), TaxRate::IVA);
        assert!(matches!(
            line,
            Err(CoreError::Validation(ValidationError::Overflow { ref field })) if field == "line_total"
        ));

        // each line fits, their sum does not
        let lines = vec![item(1, 1, i64::MAX / 2 + 1, 0.0), item(2, 1, i64::MAX / 2 + 1, 0.0)];
        assert!(matches!(
            compute_totals(&lines, Money::zero(), TaxRate::IVA),
            Err(CoreError::Validation(ValidationError::Overflow { ref field })) if field == "subtotal"
        ));
    }

    #[test]
    fn test_generate_folio_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let folio = generate_folio(&mut rng);
            assert!(is_valid_folio(&folio), "bad folio {}", folio);
        }
    }

    #[test]
    fn test_is_valid_folio() {
        assert!(is_valid_folio("VTA-ABC-0001"));
        assert!(!is_valid_folio("VTA-abc-0001"));
        assert!(!is_valid_folio("VTA-ABCD-0001"));
        assert!(!is_valid_folio("ABC-0001"));
    }
}
