//! # Report Repository
//!
//! Read-only aggregations over active (non-cancelled) sales in an
//! inclusive date range. Dates compare on the `YYYY-MM-DD` prefix of the
//! stored UTC timestamp.

use ruedas_core::report::{
    DateRange, EmployeeSales, InventoryStats, PaymentMethodSales, PeriodSummary, TopProduct,
};
use ruedas_core::{GeneralStatus, SaleType};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Totals for the period, split by cash and credit.
    pub async fn period(&self, range: &DateRange) -> DbResult<PeriodSummary> {
        let (start, end) = range.bounds();
        debug!(start = %start, end = %end, "Period report");

        let summary = sqlx::query_as::<_, PeriodSummary>(
            r#"
            SELECT
                COUNT(*) AS sale_count,
                COALESCE(SUM(total_cents), 0) AS revenue_cents,
                COALESCE(CAST(AVG(total_cents) AS INTEGER), 0) AS average_ticket_cents,
                COALESCE(SUM(tax_cents), 0) AS tax_cents,
                COALESCE(SUM(discount_cents), 0) AS discount_cents,
                COALESCE(SUM(CASE WHEN sale_type_id = ?4 THEN 1 ELSE 0 END), 0) AS cash_count,
                COALESCE(SUM(CASE WHEN sale_type_id = ?4 THEN total_cents ELSE 0 END), 0) AS cash_revenue_cents,
                COALESCE(SUM(CASE WHEN sale_type_id = ?5 THEN 1 ELSE 0 END), 0) AS credit_count,
                COALESCE(SUM(CASE WHEN sale_type_id = ?5 THEN total_cents ELSE 0 END), 0) AS credit_revenue_cents
            FROM sales
            WHERE status_id = ?3
              AND substr(sold_at, 1, 10) BETWEEN ?1 AND ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(GeneralStatus::Active.id())
        .bind(SaleType::Cash.id())
        .bind(SaleType::Credit.id())
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Best sellers by units, at most `limit` rows.
    pub async fn top_products(&self, range: &DateRange, limit: i64) -> DbResult<Vec<TopProduct>> {
        let (start, end) = range.bounds();
        debug!(start = %start, end = %end, limit, "Top products report");

        let products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                p.id AS product_id,
                p.name,
                p.barcode,
                SUM(si.quantity) AS units_sold,
                SUM(si.line_total_cents) AS revenue_cents,
                COUNT(DISTINCT s.id) AS sale_count
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            WHERE s.status_id = ?3
              AND substr(s.sold_at, 1, 10) BETWEEN ?1 AND ?2
            GROUP BY p.id, p.name, p.barcode
            ORDER BY units_sold DESC, revenue_cents DESC
            LIMIT ?4
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(GeneralStatus::Active.id())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn by_employee(&self, range: &DateRange) -> DbResult<Vec<EmployeeSales>> {
        let (start, end) = range.bounds();
        debug!(start = %start, end = %end, "Sales by employee report");

        let rows = sqlx::query_as::<_, EmployeeSales>(
            r#"
            SELECT
                e.id AS employee_id,
                TRIM(e.first_name || ' ' || e.last_name_1) AS employee_name,
                COUNT(s.id) AS sale_count,
                SUM(s.total_cents) AS revenue_cents,
                CAST(AVG(s.total_cents) AS INTEGER) AS average_ticket_cents
            FROM sales s
            JOIN employees e ON e.id = s.employee_id
            WHERE s.status_id = ?3
              AND substr(s.sold_at, 1, 10) BETWEEN ?1 AND ?2
            GROUP BY e.id, e.first_name, e.last_name_1
            ORDER BY revenue_cents DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(GeneralStatus::Active.id())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn by_payment_method(&self, range: &DateRange) -> DbResult<Vec<PaymentMethodSales>> {
        let (start, end) = range.bounds();
        debug!(start = %start, end = %end, "Sales by payment method report");

        let rows = sqlx::query_as::<_, PaymentMethodSales>(
            r#"
            SELECT
                pm.id AS payment_method_id,
                pm.name AS payment_method_name,
                COUNT(s.id) AS sale_count,
                SUM(s.total_cents) AS revenue_cents
            FROM sales s
            JOIN payment_methods pm ON pm.id = s.payment_method_id
            WHERE s.status_id = ?3
              AND substr(s.sold_at, 1, 10) BETWEEN ?1 AND ?2
            GROUP BY pm.id, pm.name
            ORDER BY revenue_cents DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(GeneralStatus::Active.id())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Catalog size and value of the active stock at sale price.
    pub async fn inventory_stats(&self) -> DbResult<InventoryStats> {
        debug!("Inventory statistics report");

        let stats = sqlx::query_as::<_, InventoryStats>(
            r#"
            SELECT
                COUNT(*) AS total_products,
                COALESCE(SUM(CASE WHEN p.status_id = ?1 THEN 1 ELSE 0 END), 0) AS active_products,
                COALESCE(SUM(CASE WHEN p.status_id = ?1 AND COALESCE(s.quantity, 0) <= p.stock_min THEN 1 ELSE 0 END), 0) AS low_stock_products,
                COALESCE(SUM(CASE WHEN p.status_id = ?1 THEN COALESCE(s.quantity, 0) * p.sale_price_cents ELSE 0 END), 0) AS inventory_value_cents
            FROM products p
            LEFT JOIN stock_levels s ON s.product_id = p.id
            "#,
        )
        .bind(GeneralStatus::Active.id())
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, Utc};

    fn today() -> DateRange {
        DateRange::last_days(Utc::now().date_naive(), 0)
    }

    #[tokio::test]
    async fn test_empty_period() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let reports = db.reports();

        let summary = reports.period(&today()).await.unwrap();
        assert_eq!(summary.sale_count, 0);
        assert_eq!(summary.revenue_cents, 0);
        assert_eq!(summary.average_ticket_cents, 0);

        assert!(reports.top_products(&today(), 10).await.unwrap().is_empty());
        assert!(reports.by_employee(&today()).await.unwrap().is_empty());
        assert!(reports.by_payment_method(&today()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inventory_stats_on_empty_catalog() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let stats = db.reports().inventory_stats().await.unwrap();
        assert_eq!(stats.total_products, 0);
        assert_eq!(stats.inventory_value_cents, 0);
    }

    #[tokio::test]
    async fn test_range_outside_sales_is_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let old = DateRange {
            start: NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2001, 1, 31).unwrap(),
        };

        assert_eq!(db.reports().period(&old).await.unwrap().sale_count, 0);
    }
}
