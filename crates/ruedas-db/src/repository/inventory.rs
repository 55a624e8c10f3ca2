//! # Inventory Repository
//!
//! Manual stock operations (adjustments and inbound receipts) and the
//! read side of the ledger: levels, movement history, low stock, audits.

use ruedas_core::entities::{MovementRecord, Product};
use ruedas_core::report::DateRange;
use ruedas_core::stock::{plan_adjustment, AdjustmentRequest, EntryRequest, StockAudit, StockLevel};
use ruedas_core::{MovementKind, StockDirection};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::product::ProductRepository;
use crate::error::{DbError, DbResult};
use crate::ledger::{self, NewMovement};
use crate::uow::UnitOfWork;

const MOVEMENT_SELECT: &str = r#"
    SELECT
        md.id,
        md.movement_id,
        md.product_id,
        m.movement_type_id AS kind,
        mt.name AS kind_name,
        md.direction,
        md.quantity,
        md.stock_before,
        md.stock_after,
        m.employee_id,
        TRIM(e.first_name || ' ' || e.last_name_1) AS employee_name,
        m.note,
        m.moved_at
    FROM movement_details md
    JOIN movements m ON m.id = md.movement_id
    JOIN movement_types mt ON mt.id = m.movement_type_id
    LEFT JOIN employees e ON e.id = m.employee_id
"#;

/// Result of a stock adjustment.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdjustmentOutcome {
    /// Target equals the current stock; nothing was written.
    NoChange { current: i64 },
    Applied {
        record: MovementRecord,
        /// Signed: target − previous stock.
        delta: i64,
        level: StockLevel,
    },
}

impl AdjustmentOutcome {
    pub fn message(&self) -> String {
        match self {
            AdjustmentOutcome::NoChange { .. } => "no adjustment needed".to_string(),
            AdjustmentOutcome::Applied { delta, .. } => {
                format!("Adjustment applied: {} units", delta)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    pub async fn stock(&self, product_id: i64) -> DbResult<StockLevel> {
        let mut conn = self.pool.acquire().await?;
        ledger::stock_level(&mut conn, product_id).await
    }

    /// Sets the stock of a product to an absolute quantity.
    ///
    /// Writes one adjustment movement for the difference, in whichever
    /// direction it points. Negative targets are accepted.
    pub async fn adjust(&self, request: &AdjustmentRequest) -> DbResult<AdjustmentOutcome> {
        request.validate()?;
        debug!(
            product_id = request.product_id,
            target = request.new_quantity,
            "Adjusting stock"
        );

        let mut uow = UnitOfWork::begin(&self.pool, "adjust_stock").await?;
        let current = ledger::stock_level(uow.conn()?, request.product_id).await?;

        let Some(change) = plan_adjustment(current.current_stock, request.new_quantity)? else {
            uow.commit().await?;
            debug!(product_id = request.product_id, "Stock already at target");
            return Ok(AdjustmentOutcome::NoChange {
                current: current.current_stock,
            });
        };

        let recorded = ledger::record_movement(
            uow.conn()?,
            NewMovement {
                kind: MovementKind::Adjustment,
                direction: change.direction,
                product_id: request.product_id,
                employee_id: request.employee_id,
                quantity: change.quantity,
                sale_id: None,
                note: Some(request.reason.trim()),
            },
        )
        .await?;

        let record = movement_record(uow.conn()?, recorded.detail_id).await?;
        let level = ledger::stock_level(uow.conn()?, request.product_id).await?;
        uow.commit().await?;

        let delta = change.direction.sign() * change.quantity;
        info!(
            product_id = request.product_id,
            delta,
            stock = level.current_stock,
            "Stock adjusted"
        );

        Ok(AdjustmentOutcome::Applied { record, delta, level })
    }

    /// Receives goods: one inbound movement.
    pub async fn entry(&self, request: &EntryRequest) -> DbResult<(MovementRecord, StockLevel)> {
        request.validate()?;
        debug!(
            product_id = request.product_id,
            quantity = request.quantity,
            "Recording stock entry"
        );

        let mut uow = UnitOfWork::begin(&self.pool, "stock_entry").await?;

        // Fails with NotFound before anything is written
        ledger::stock_level(uow.conn()?, request.product_id).await?;

        let recorded = ledger::record_movement(
            uow.conn()?,
            NewMovement {
                kind: MovementKind::Inbound,
                direction: StockDirection::In,
                product_id: request.product_id,
                employee_id: request.employee_id,
                quantity: request.quantity,
                sale_id: None,
                note: request.concept.as_deref().map(str::trim),
            },
        )
        .await?;

        let record = movement_record(uow.conn()?, recorded.detail_id).await?;
        let level = ledger::stock_level(uow.conn()?, request.product_id).await?;
        uow.commit().await?;

        info!(
            product_id = request.product_id,
            quantity = request.quantity,
            stock = level.current_stock,
            "Stock entry recorded"
        );

        Ok((record, level))
    }

    /// Movement history of a product, newest first.
    pub async fn movements(&self, product_id: i64, range: Option<&DateRange>) -> DbResult<Vec<MovementRecord>> {
        let movements = match range {
            Some(range) => {
                let (start, end) = range.bounds();
                let sql = format!(
                    "{} WHERE md.product_id = ?1 AND substr(m.moved_at, 1, 10) BETWEEN ?2 AND ?3 ORDER BY m.moved_at DESC, md.id DESC",
                    MOVEMENT_SELECT
                );
                sqlx::query_as::<_, MovementRecord>(&sql)
                    .bind(product_id)
                    .bind(start)
                    .bind(end)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "{} WHERE md.product_id = ?1 ORDER BY m.moved_at DESC, md.id DESC",
                    MOVEMENT_SELECT
                );
                sqlx::query_as::<_, MovementRecord>(&sql)
                    .bind(product_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(movements)
    }

    /// Active products at or below their minimum.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        ProductRepository::new(self.pool.clone()).low_stock().await
    }

    /// Counter against the sum of the movement log.
    pub async fn audit(&self, product_id: i64) -> DbResult<StockAudit> {
        let mut conn = self.pool.acquire().await?;
        ledger::audit(&mut conn, product_id).await
    }
}

async fn movement_record(conn: &mut SqliteConnection, detail_id: i64) -> DbResult<MovementRecord> {
    let sql = format!("{} WHERE md.id = ?1", MOVEMENT_SELECT);
    sqlx::query_as::<_, MovementRecord>(&sql)
        .bind(detail_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Movement", detail_id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use ruedas_core::entities::NewProduct;

    async fn setup() -> (Database, i64, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let employee_id: i64 = sqlx::query_scalar(
            "INSERT INTO employees (first_name, last_name_1, rfc, created_at) VALUES ('Ana', 'Ruiz', 'RUAA800101AB1', ?1) RETURNING id",
        )
        .bind(Utc::now())
        .fetch_one(db.pool())
        .await
        .unwrap();

        let product = db
            .products()
            .create(&NewProduct {
                name: "Cámara 26x1.95".to_string(),
                barcode: Some("7501000000011".to_string()),
                description: None,
                purchase_price_cents: 4_000,
                sale_price_cents: 8_500,
                stock_min: 5,
                stock_max: 100,
                brand_id: None,
                category_id: None,
                unit_id: None,
            })
            .await
            .unwrap();

        (db, employee_id, product.id)
    }

    fn entry(product_id: i64, employee_id: i64, quantity: i64) -> EntryRequest {
        EntryRequest {
            product_id,
            employee_id,
            quantity,
            concept: Some("Compra a proveedor".to_string()),
        }
    }

    fn adjustment(product_id: i64, employee_id: i64, new_quantity: i64) -> AdjustmentRequest {
        AdjustmentRequest {
            product_id,
            employee_id,
            new_quantity,
            reason: "Conteo físico".to_string(),
        }
    }

    #[tokio::test]
    async fn test_entry_records_inbound_movement() {
        let (db, employee_id, product_id) = setup().await;
        let inventory = db.inventory();

        let (record, level) = inventory.entry(&entry(product_id, employee_id, 50)).await.unwrap();

        assert_eq!(record.kind, MovementKind::Inbound);
        assert_eq!(record.direction, StockDirection::In);
        assert_eq!((record.stock_before, record.stock_after), (0, 50));
        assert_eq!(record.employee_name.as_deref(), Some("Ana Ruiz"));
        assert_eq!(level.current_stock, 50);
    }

    #[tokio::test]
    async fn test_entry_rejects_non_positive_quantity() {
        let (db, employee_id, product_id) = setup().await;

        let err = db.inventory().entry(&entry(product_id, employee_id, 0)).await.unwrap_err();

        assert!(matches!(err, DbError::Domain(_)));
        assert!(db.inventory().movements(product_id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_adjust_to_current_is_noop() {
        let (db, employee_id, product_id) = setup().await;
        let inventory = db.inventory();
        inventory.entry(&entry(product_id, employee_id, 50)).await.unwrap();

        let outcome = inventory.adjust(&adjustment(product_id, employee_id, 50)).await.unwrap();

        assert!(matches!(outcome, AdjustmentOutcome::NoChange { current: 50 }));
        assert_eq!(outcome.message(), "no adjustment needed");
        assert_eq!(inventory.movements(product_id, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_adjust_down_and_up() {
        let (db, employee_id, product_id) = setup().await;
        let inventory = db.inventory();
        inventory.entry(&entry(product_id, employee_id, 50)).await.unwrap();

        let down = inventory.adjust(&adjustment(product_id, employee_id, 47)).await.unwrap();
        assert_eq!(down.message(), "Adjustment applied: -3 units");
        match &down {
            AdjustmentOutcome::Applied { record, level, .. } => {
                assert_eq!(record.kind, MovementKind::Adjustment);
                assert_eq!(record.direction, StockDirection::Out);
                assert_eq!(record.note.as_deref(), Some("Conteo físico"));
                assert_eq!(level.current_stock, 47);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let up = inventory.adjust(&adjustment(product_id, employee_id, 60)).await.unwrap();
        assert_eq!(up.message(), "Adjustment applied: 13 units");

        let history = inventory.movements(product_id, None).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].stock_after, 60);
        assert!(inventory.audit(product_id).await.unwrap().consistent);
    }

    #[tokio::test]
    async fn test_low_stock_and_unknown_product() {
        let (db, employee_id, product_id) = setup().await;
        let inventory = db.inventory();
        inventory.entry(&entry(product_id, employee_id, 5)).await.unwrap();

        let low = inventory.low_stock().await.unwrap();
        assert_eq!(low.iter().map(|p| p.id).collect::<Vec<_>>(), vec![product_id]);

        let err = inventory.stock(999).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
