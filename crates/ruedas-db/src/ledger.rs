//! # Stock Ledger
//!
//! Writes and reads of the movement log and the `stock_levels` counter.
//! Every function takes the connection of an open [`UnitOfWork`] (or a
//! plain pooled connection for reads), so the counter and the log always
//! change in the same transaction.
//!
//! ## Recording a Movement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_movement(conn, NewMovement { SaleOutbound, product 7, qty 2 })  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ensure stock_levels row exists                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE stock_levels SET quantity = quantity - 2                        │
//! │  WHERE product_id = 7 AND quantity >= 2      ◄── guard (sales only)     │
//! │  RETURNING quantity                                                     │
//! │       │                                                                 │
//! │       ├── no row ──► CoreError::InsufficientStock (caller rolls back)   │
//! │       ▼                                                                 │
//! │  INSERT movements (type, employee, sale, note)                          │
//! │  INSERT movement_details (direction, qty, before, after)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`UnitOfWork`]: crate::uow::UnitOfWork

use chrono::Utc;
use ruedas_core::stock::{plan_inbound, plan_outbound, StockAudit, StockChange, StockLevel};
use ruedas_core::{CoreError, MovementKind, StockDirection};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// A movement to record for one product.
#[derive(Debug, Clone)]
pub struct NewMovement<'a> {
    pub kind: MovementKind,
    pub direction: StockDirection,
    pub product_id: i64,
    pub employee_id: i64,
    /// Always positive.
    pub quantity: i64,
    pub sale_id: Option<i64>,
    pub note: Option<&'a str>,
}

/// Ids and stock snapshot of a recorded movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedMovement {
    pub movement_id: i64,
    pub detail_id: i64,
    pub change: StockChange,
}

// =============================================================================
// Reads
// =============================================================================

/// Counter value for a product. A product with no row has zero stock.
pub async fn current_stock(conn: &mut SqliteConnection, product_id: i64) -> DbResult<i64> {
    let quantity: Option<i64> =
        sqlx::query_scalar("SELECT quantity FROM stock_levels WHERE product_id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(quantity.unwrap_or(0))
}

/// Stock recomputed from the movement log: Σ(in) − Σ(out).
pub async fn derived_stock(conn: &mut SqliteConnection, product_id: i64) -> DbResult<i64> {
    let derived: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(CASE direction WHEN 'in' THEN quantity ELSE -quantity END), 0)
        FROM movement_details
        WHERE product_id = ?1
        "#,
    )
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(derived)
}

/// Name, counter and minimum of a product (any status).
pub async fn stock_level(conn: &mut SqliteConnection, product_id: i64) -> DbResult<StockLevel> {
    sqlx::query_as::<_, StockLevel>(
        r#"
        SELECT p.id AS product_id,
               p.name AS product_name,
               COALESCE(s.quantity, 0) AS current_stock,
               p.stock_min
        FROM products p
        LEFT JOIN stock_levels s ON s.product_id = p.id
        WHERE p.id = ?1
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Product", product_id))
}

/// Compares the counter with the derived sum.
pub async fn audit(conn: &mut SqliteConnection, product_id: i64) -> DbResult<StockAudit> {
    let level = stock_level(conn, product_id).await?;
    let derived = derived_stock(conn, product_id).await?;

    let audit = StockAudit::new(product_id, level.product_name, level.current_stock, derived);
    if !audit.consistent {
        tracing::warn!(
            product_id,
            counter = audit.counter,
            derived = audit.derived,
            "Stock counter disagrees with movement log"
        );
    }
    Ok(audit)
}

// =============================================================================
// Writes
// =============================================================================

/// Applies a movement to the counter and appends it to the log.
///
/// Sale outbound movements use the guarded decrement and fail with
/// `InsufficientStock` when the counter no longer covers the quantity.
/// Adjustments may take the counter below zero.
pub async fn record_movement(
    conn: &mut SqliteConnection,
    movement: NewMovement<'_>,
) -> DbResult<RecordedMovement> {
    debug!(
        product_id = movement.product_id,
        kind = ?movement.kind,
        direction = ?movement.direction,
        quantity = movement.quantity,
        "Recording stock movement"
    );

    sqlx::query(
        "INSERT INTO stock_levels (product_id, quantity) VALUES (?1, 0) ON CONFLICT(product_id) DO NOTHING",
    )
    .bind(movement.product_id)
    .execute(&mut *conn)
    .await?;

    let after: Option<i64> = match (movement.direction, movement.kind) {
        (StockDirection::Out, MovementKind::SaleOutbound) => {
            sqlx::query_scalar(
                r#"
                UPDATE stock_levels
                SET quantity = quantity - ?1
                WHERE product_id = ?2 AND quantity >= ?1
                RETURNING quantity
                "#,
            )
            .bind(movement.quantity)
            .bind(movement.product_id)
            .fetch_optional(&mut *conn)
            .await?
        }
        (direction, _) => {
            sqlx::query_scalar(
                r#"
                UPDATE stock_levels
                SET quantity = quantity + ?1
                WHERE product_id = ?2
                RETURNING quantity
                "#,
            )
            .bind(direction.sign() * movement.quantity)
            .bind(movement.product_id)
            .fetch_optional(&mut *conn)
            .await?
        }
    };

    let after = match after {
        Some(after) => after,
        None => {
            let label = product_label(conn, movement.product_id).await?;
            return Err(CoreError::InsufficientStock {
                products: vec![label],
            }
            .into());
        }
    };

    // RETURNING only yields the new counter
    let before = after - movement.direction.sign() * movement.quantity;
    let change = match movement.direction {
        StockDirection::In => plan_inbound(before, movement.quantity),
        StockDirection::Out => plan_outbound(before, movement.quantity),
    };

    let movement_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO movements (movement_type_id, employee_id, sale_id, note, moved_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id
        "#,
    )
    .bind(movement.kind.id())
    .bind(movement.employee_id)
    .bind(movement.sale_id)
    .bind(movement.note)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    let detail_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO movement_details (movement_id, product_id, direction, quantity, stock_before, stock_after)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING id
        "#,
    )
    .bind(movement_id)
    .bind(movement.product_id)
    .bind(change.direction)
    .bind(change.quantity)
    .bind(change.before)
    .bind(change.after)
    .fetch_one(&mut *conn)
    .await?;

    Ok(RecordedMovement {
        movement_id,
        detail_id,
        change,
    })
}

/// Product name for error messages, or `ID <n>` when it doesn't exist.
pub async fn product_label(conn: &mut SqliteConnection, product_id: i64) -> DbResult<String> {
    let name: Option<String> = sqlx::query_scalar("SELECT name FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(name.unwrap_or_else(|| format!("ID {}", product_id)))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::uow::UnitOfWork;

    async fn setup() -> (Database, i64, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let employee_id: i64 = sqlx::query_scalar(
            "INSERT INTO employees (first_name, last_name_1, rfc, created_at) VALUES ('Ana', 'Ruiz', 'RUAA800101AB1', ?1) RETURNING id",
        )
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
        .unwrap();

        let product_id: i64 = sqlx::query_scalar(
            "INSERT INTO products (name, purchase_price_cents, sale_price_cents, created_at) VALUES ('Cadena KMC X11', 30000, 45000, ?1) RETURNING id",
        )
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
        .unwrap();

        (db, employee_id, product_id)
    }

    fn movement(kind: MovementKind, direction: StockDirection, product_id: i64, employee_id: i64, quantity: i64) -> NewMovement<'static> {
        NewMovement {
            kind,
            direction,
            product_id,
            employee_id,
            quantity,
            sale_id: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_counter_tracks_log() {
        let (db, employee_id, product_id) = setup().await;
        let mut uow = UnitOfWork::begin(db.pool(), "test").await.unwrap();

        let inbound = record_movement(
            uow.conn().unwrap(),
            movement(MovementKind::Inbound, StockDirection::In, product_id, employee_id, 10),
        )
        .await
        .unwrap();
        assert_eq!((inbound.change.before, inbound.change.after), (0, 10));

        let adjust = record_movement(
            uow.conn().unwrap(),
            movement(MovementKind::Adjustment, StockDirection::Out, product_id, employee_id, 3),
        )
        .await
        .unwrap();
        assert_eq!((adjust.change.before, adjust.change.after), (10, 7));

        let conn = uow.conn().unwrap();
        assert_eq!(current_stock(conn, product_id).await.unwrap(), 7);
        assert_eq!(derived_stock(conn, product_id).await.unwrap(), 7);
        assert!(audit(conn, product_id).await.unwrap().consistent);
    }

    #[tokio::test]
    async fn test_guarded_decrement_rejects_oversell() {
        let (db, employee_id, product_id) = setup().await;
        let mut uow = UnitOfWork::begin(db.pool(), "test").await.unwrap();

        record_movement(
            uow.conn().unwrap(),
            movement(MovementKind::Inbound, StockDirection::In, product_id, employee_id, 1),
        )
        .await
        .unwrap();

        let err = record_movement(
            uow.conn().unwrap(),
            movement(MovementKind::SaleOutbound, StockDirection::Out, product_id, employee_id, 2),
        )
        .await
        .unwrap_err();

        match err {
            DbError::Domain(CoreError::InsufficientStock { products }) => {
                assert_eq!(products, vec!["Cadena KMC X11".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(current_stock(uow.conn().unwrap(), product_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_adjustment_may_go_negative() {
        let (db, employee_id, product_id) = setup().await;
        let mut uow = UnitOfWork::begin(db.pool(), "test").await.unwrap();

        let recorded = record_movement(
            uow.conn().unwrap(),
            movement(MovementKind::Adjustment, StockDirection::Out, product_id, employee_id, 4),
        )
        .await
        .unwrap();

        assert_eq!(recorded.change.after, -4);
        assert!(audit(uow.conn().unwrap(), product_id).await.unwrap().consistent);
    }

    #[tokio::test]
    async fn test_unknown_product_label() {
        let (db, _, _) = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(product_label(&mut conn, 999).await.unwrap(), "ID 999");
    }
}
