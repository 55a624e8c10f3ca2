//! # Sale Repository
//!
//! Processes and cancels sales. Both run in a single [`UnitOfWork`]: a
//! failure at any step leaves no trace in the database.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleRequest                                                            │
//! │       │ validate + compute_totals (pure, ruedas-core)                   │
//! │       ▼                                                                 │
//! │  BEGIN ─► pre-check every product ──► shortages? ──► InsufficientStock  │
//! │       │                                  (lists all, zero writes)       │
//! │       ▼                                                                 │
//! │  INSERT sales (folio retried on UNIQUE collision)                       │
//! │       │                                                                 │
//! │       ▼  per line                                                       │
//! │  INSERT sale_items ─► ledger::record_movement (guarded decrement)       │
//! │       │                                                                 │
//! │       ▼  credit + customer                                              │
//! │  customers.balance += pending ─► INSERT receivables                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ─► SaleOutcome { receipt, stock levels after the sale }         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`UnitOfWork`]: crate::uow::UnitOfWork

use chrono::{DateTime, Utc};
use ruedas_core::report::DateRange;
use ruedas_core::sale::{
    compute_totals, credit_terms, generate_folio, is_valid_folio, CreditTerms, Sale, SaleDetail,
    SaleLine, SaleReceipt, SaleRequest, SaleTotals,
};
use ruedas_core::stock::StockLevel;
use ruedas_core::{
    CoreError, GeneralStatus, Money, MovementKind, SaleTerms, SaleType, StockDirection,
    ValidationError, FOLIO_MAX_ATTEMPTS,
};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::ledger::{self, NewMovement};
use crate::uow::UnitOfWork;

const SALE_SELECT: &str = r#"
    SELECT
        s.id,
        s.folio,
        s.sold_at,
        s.credit_due_date,
        s.subtotal_cents,
        s.tax_cents,
        s.discount_cents,
        s.total_cents,
        s.down_payment_cents,
        s.pending_balance_cents,
        s.cash_received_cents,
        s.change_cents,
        s.sale_type_id AS sale_type,
        st.name AS sale_type_name,
        s.customer_id,
        c.name AS customer_name,
        s.employee_id,
        TRIM(e.first_name || ' ' || e.last_name_1) AS employee_name,
        s.payment_method_id,
        pm.name AS payment_method_name,
        s.status_id AS status,
        s.cancelled_at
    FROM sales s
    JOIN sale_types st ON st.id = s.sale_type_id
    LEFT JOIN customers c ON c.id = s.customer_id
    JOIN employees e ON e.id = s.employee_id
    JOIN payment_methods pm ON pm.id = s.payment_method_id
"#;

// =============================================================================
// Outcomes
// =============================================================================

/// A committed sale and the stock of every product it touched.
#[derive(Debug, Clone, Serialize)]
pub struct SaleOutcome {
    pub receipt: SaleReceipt,
    pub stock: Vec<StockLevel>,
}

/// A cancelled sale and the restocked levels.
#[derive(Debug, Clone, Serialize)]
pub struct CancelledSale {
    pub sale_id: i64,
    pub folio: String,
    pub cancelled_at: DateTime<Utc>,
    pub restocked: Vec<StockLevel>,
}

#[derive(Debug, FromRow)]
struct CancelTarget {
    folio: String,
    status: GeneralStatus,
    status_name: String,
    sale_type: SaleType,
    customer_id: Option<i64>,
    employee_id: i64,
    pending_balance_cents: i64,
}

#[derive(Debug, FromRow)]
struct Availability {
    name: String,
    quantity: i64,
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a complete sale.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(CoreError::InsufficientStock))` - one or more
    ///   products can't cover the request; every one is listed
    /// * `Err(DbError::Domain(CoreError::FolioExhausted))` - every folio
    ///   attempt collided
    /// * `Err(DbError::Domain(CoreError::Validation(_)))` - bad request or
    ///   totals out of range
    pub async fn process_sale(&self, request: &SaleRequest, terms: SaleTerms) -> DbResult<SaleOutcome> {
        let sale_type = request.validate()?;
        let computation = compute_totals(
            &request.items,
            Money::from_cents(request.general_discount_cents),
            terms.tax_rate,
        )?;
        let sold_at = Utc::now();
        let credit = credit_terms(
            sale_type,
            computation.totals.total(),
            Money::from_cents(request.down_payment_cents),
            sold_at,
            terms.credit_term_days,
        )?;
        let requested = request.requested_quantities();

        debug!(
            employee_id = request.employee_id,
            lines = computation.lines.len(),
            total_cents = computation.totals.total_cents,
            "Processing sale"
        );

        let mut uow = UnitOfWork::begin(&self.pool, "process_sale").await?;

        let shortages = find_shortages(uow.conn()?, &requested).await?;
        if !shortages.is_empty() {
            warn!(products = ?shortages, "Sale rejected for insufficient stock");
            return Err(CoreError::InsufficientStock { products: shortages }.into());
        }

        let header = SaleHeader {
            request,
            sale_type,
            totals: &computation.totals,
            credit: &credit,
            sold_at,
        };
        let (sale_id, folio) =
            insert_header(uow.conn()?, &header, || generate_folio(&mut rand::thread_rng())).await?;

        let note = format!("Sale {}", folio);
        for line in &computation.lines {
            sqlx::query(
                r#"
                INSERT INTO sale_items (sale_id, product_id, quantity, unit_price_cents, discount_bps, line_total_cents)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(sale_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .bind(i64::from(line.discount.bps()))
            .bind(line.line_total.cents())
            .execute(uow.conn()?)
            .await?;

            ledger::record_movement(
                uow.conn()?,
                NewMovement {
                    kind: MovementKind::SaleOutbound,
                    direction: StockDirection::Out,
                    product_id: line.product_id,
                    employee_id: request.employee_id,
                    quantity: line.quantity,
                    sale_id: Some(sale_id),
                    note: Some(&note),
                },
            )
            .await?;
        }

        if let (SaleType::Credit, Some(customer_id)) = (sale_type, request.customer_id) {
            let pending = credit.pending_balance.cents();

            let result = sqlx::query("UPDATE customers SET balance_cents = balance_cents + ?2 WHERE id = ?1")
                .bind(customer_id)
                .bind(pending)
                .execute(uow.conn()?)
                .await?;
            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Customer", customer_id));
            }

            sqlx::query(
                r#"
                INSERT INTO receivables (customer_id, sale_id, amount_cents, issued_at, due_date, status_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(customer_id)
            .bind(sale_id)
            .bind(pending)
            .bind(sold_at)
            .bind(credit.due_date)
            .bind(GeneralStatus::Active.id())
            .execute(uow.conn()?)
            .await?;

            debug!(customer_id, pending_cents = pending, "Receivable recorded");
        }

        let mut stock = Vec::with_capacity(requested.len());
        for (product_id, _) in &requested {
            stock.push(ledger::stock_level(uow.conn()?, *product_id).await?);
        }

        uow.commit().await?;

        info!(
            sale_id,
            folio = %folio,
            total_cents = computation.totals.total_cents,
            "Sale processed"
        );

        Ok(SaleOutcome {
            receipt: SaleReceipt {
                sale_id,
                folio,
                totals: computation.totals,
                pending_balance_cents: credit.pending_balance.cents(),
                credit_due_date: credit.due_date,
                sold_at,
            },
            stock,
        })
    }

    /// Cancels an active sale: returns its units to stock with inbound
    /// movements and reverses the customer's balance on credit sales.
    pub async fn cancel(&self, sale_id: i64) -> DbResult<CancelledSale> {
        debug!(sale_id, "Cancelling sale");

        let mut uow = UnitOfWork::begin(&self.pool, "cancel_sale").await?;

        let target = sqlx::query_as::<_, CancelTarget>(
            r#"
            SELECT s.folio,
                   s.status_id AS status,
                   gs.name AS status_name,
                   s.sale_type_id AS sale_type,
                   s.customer_id,
                   s.employee_id,
                   s.pending_balance_cents
            FROM sales s
            JOIN general_status gs ON gs.id = s.status_id
            WHERE s.id = ?1
            "#,
        )
        .bind(sale_id)
        .fetch_optional(uow.conn()?)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        if target.status != GeneralStatus::Active {
            return Err(CoreError::InvalidSaleStatus {
                sale_id,
                status: target.status_name,
            }
            .into());
        }

        let items: Vec<(i64, i64)> =
            sqlx::query_as("SELECT product_id, quantity FROM sale_items WHERE sale_id = ?1 ORDER BY id")
                .bind(sale_id)
                .fetch_all(uow.conn()?)
                .await?;

        let note = format!("Sale {} cancelled", target.folio);
        for (product_id, quantity) in &items {
            ledger::record_movement(
                uow.conn()?,
                NewMovement {
                    kind: MovementKind::Inbound,
                    direction: StockDirection::In,
                    product_id: *product_id,
                    employee_id: target.employee_id,
                    quantity: *quantity,
                    sale_id: Some(sale_id),
                    note: Some(&note),
                },
            )
            .await?;
        }

        let cancelled_at = Utc::now();
        sqlx::query("UPDATE sales SET status_id = ?2, cancelled_at = ?3 WHERE id = ?1")
            .bind(sale_id)
            .bind(GeneralStatus::Cancelled.id())
            .bind(cancelled_at)
            .execute(uow.conn()?)
            .await?;

        if let (SaleType::Credit, Some(customer_id)) = (target.sale_type, target.customer_id) {
            sqlx::query("UPDATE customers SET balance_cents = balance_cents - ?2 WHERE id = ?1")
                .bind(customer_id)
                .bind(target.pending_balance_cents)
                .execute(uow.conn()?)
                .await?;

            sqlx::query("UPDATE receivables SET status_id = ?2 WHERE sale_id = ?1")
                .bind(sale_id)
                .bind(GeneralStatus::Cancelled.id())
                .execute(uow.conn()?)
                .await?;
        }

        let mut restocked: Vec<StockLevel> = Vec::new();
        for (product_id, _) in &items {
            if restocked.iter().any(|level| level.product_id == *product_id) {
                continue;
            }
            restocked.push(ledger::stock_level(uow.conn()?, *product_id).await?);
        }

        uow.commit().await?;

        info!(sale_id, folio = %target.folio, "Sale cancelled");

        Ok(CancelledSale {
            sale_id,
            folio: target.folio,
            cancelled_at,
            restocked,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Every sale (any status), newest first. `None` lists all of them.
    pub async fn list(&self, range: Option<&DateRange>) -> DbResult<Vec<Sale>> {
        match range {
            Some(range) => {
                let (start, end) = range.bounds();
                let sql = format!(
                    "{} WHERE substr(s.sold_at, 1, 10) BETWEEN ?1 AND ?2 ORDER BY s.sold_at DESC, s.id DESC",
                    SALE_SELECT
                );
                Ok(sqlx::query_as::<_, Sale>(&sql)
                    .bind(start)
                    .bind(end)
                    .fetch_all(&self.pool)
                    .await?)
            }
            None => {
                let sql = format!("{} ORDER BY s.sold_at DESC, s.id DESC", SALE_SELECT);
                Ok(sqlx::query_as::<_, Sale>(&sql).fetch_all(&self.pool).await?)
            }
        }
    }

    /// Sale header with its lines.
    pub async fn get(&self, id: i64) -> DbResult<SaleDetail> {
        let sql = format!("{} WHERE s.id = ?1", SALE_SELECT);
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT si.id,
                   si.sale_id,
                   si.product_id,
                   p.name AS product_name,
                   p.barcode,
                   si.quantity,
                   si.unit_price_cents,
                   si.discount_bps,
                   si.line_total_cents
            FROM sale_items si
            JOIN products p ON p.id = si.product_id
            WHERE si.sale_id = ?1
            ORDER BY si.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(SaleDetail { sale, lines })
    }

    pub async fn by_customer(&self, customer_id: i64) -> DbResult<Vec<Sale>> {
        let sql = format!("{} WHERE s.customer_id = ?1 ORDER BY s.sold_at DESC, s.id DESC", SALE_SELECT);
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    pub async fn by_employee(&self, employee_id: i64, range: Option<&DateRange>) -> DbResult<Vec<Sale>> {
        let sales = match range {
            Some(range) => {
                let (start, end) = range.bounds();
                let sql = format!(
                    "{} WHERE s.employee_id = ?1 AND substr(s.sold_at, 1, 10) BETWEEN ?2 AND ?3 ORDER BY s.sold_at DESC, s.id DESC",
                    SALE_SELECT
                );
                sqlx::query_as::<_, Sale>(&sql)
                    .bind(employee_id)
                    .bind(start)
                    .bind(end)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{} WHERE s.employee_id = ?1 ORDER BY s.sold_at DESC, s.id DESC", SALE_SELECT);
                sqlx::query_as::<_, Sale>(&sql)
                    .bind(employee_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(sales)
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Products whose stock doesn't cover the requested total. Unknown and
/// inactive products are reported as `ID <n>`.
async fn find_shortages(conn: &mut SqliteConnection, requested: &[(i64, i64)]) -> DbResult<Vec<String>> {
    let mut shortages = Vec::new();

    for (product_id, quantity) in requested {
        let available = sqlx::query_as::<_, Availability>(
            r#"
            SELECT p.name, COALESCE(s.quantity, 0) AS quantity
            FROM products p
            LEFT JOIN stock_levels s ON s.product_id = p.id
            WHERE p.id = ?1 AND p.status_id = ?2
            "#,
        )
        .bind(*product_id)
        .bind(GeneralStatus::Active.id())
        .fetch_optional(&mut *conn)
        .await?;

        match available {
            Some(a) if ruedas_core::stock::is_sufficient(a.quantity, *quantity) => {}
            Some(a) => shortages.push(a.name),
            None => shortages.push(format!("ID {}", product_id)),
        }
    }

    Ok(shortages)
}

struct SaleHeader<'a> {
    request: &'a SaleRequest,
    sale_type: SaleType,
    totals: &'a SaleTotals,
    credit: &'a CreditTerms,
    sold_at: DateTime<Utc>,
}

/// Inserts the sale row, drawing a new folio from `next_folio` whenever
/// the previous one collides with an existing sale. A drawn folio that
/// isn't `VTA-ABC-1234` shaped is rejected without touching the table.
async fn insert_header<F>(
    conn: &mut SqliteConnection,
    header: &SaleHeader<'_>,
    mut next_folio: F,
) -> DbResult<(i64, String)>
where
    F: FnMut() -> String,
{
    let request = header.request;

    for attempt in 1..=FOLIO_MAX_ATTEMPTS {
        let folio = next_folio();
        if !is_valid_folio(&folio) {
            return Err(ValidationError::InvalidFormat {
                field: "folio".to_string(),
                reason: format!("'{}' is not VTA-ABC-1234", folio),
            }
            .into());
        }

        let inserted: Result<i64, sqlx::Error> = sqlx::query_scalar(
            r#"
            INSERT INTO sales (
                folio, sold_at, credit_due_date,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                down_payment_cents, pending_balance_cents,
                cash_received_cents, change_cents,
                sale_type_id, customer_id, employee_id, payment_method_id,
                status_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            RETURNING id
            "#,
        )
        .bind(&folio)
        .bind(header.sold_at)
        .bind(header.credit.due_date)
        .bind(header.totals.subtotal_cents)
        .bind(header.totals.tax_cents)
        .bind(header.totals.discount_cents)
        .bind(header.totals.total_cents)
        .bind(request.down_payment_cents)
        .bind(header.credit.pending_balance.cents())
        .bind(request.cash_received_cents)
        .bind(request.change_cents)
        .bind(header.sale_type.id())
        .bind(request.customer_id)
        .bind(request.employee_id)
        .bind(request.payment_method_id)
        .bind(GeneralStatus::Active.id())
        .fetch_one(&mut *conn)
        .await;

        match inserted.map_err(DbError::from) {
            Ok(id) => return Ok((id, folio)),
            Err(err) if err.is_unique_violation_on("folio") => {
                warn!(attempt, folio = %folio, "Folio collision, regenerating");
            }
            Err(err) => return Err(err),
        }
    }

    Err(CoreError::FolioExhausted {
        attempts: FOLIO_MAX_ATTEMPTS,
    }
    .into())
}

// =============================================================================
// Unit Tests
// =============================================================================
