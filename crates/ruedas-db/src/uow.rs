//! # Unit of Work
//!
//! A scoped database transaction. Every multi-statement write (sale,
//! cancellation, stock adjustment, entry, entity + contact creation) runs
//! inside one.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  let mut uow = UnitOfWork::begin(&pool, "process_sale").await?;        │
//! │       │                                                                 │
//! │       ├── sqlx::query(..).execute(uow.conn()?).await?                   │
//! │       ├── ledger::record_movement(uow.conn()?, ..).await?               │
//! │       │        │                                                        │
//! │       │        └── any `?` returns early ──► uow dropped ──► ROLLBACK   │
//! │       ▼                                                                 │
//! │  uow.commit().await?                            ──► COMMIT              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transaction owns its pooled connection until commit or drop. Code
//! holding a `UnitOfWork` must not go back to the pool: an in-memory
//! database has exactly one connection.
//!
//! ## Write Lock
//! Units open with `BEGIN IMMEDIATE`, taking SQLite's write lock before the
//! first read. Concurrent units queue on the pool's busy timeout instead of
//! failing with `database is locked` when a read transaction tries to
//! upgrade to a writer after another connection committed.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";
use tracing::debug;

use crate::error::{DbError, DbResult};

/// A transaction that rolls back unless [`UnitOfWork::commit`] is called.
pub struct UnitOfWork {
    tx: Option<Transaction<'static, Sqlite>>,
    label: &'static str,
}

impl UnitOfWork {
    /// Opens a write transaction on a pooled connection, waiting for the
    /// write lock if another unit holds it.
    pub async fn begin(pool: &SqlitePool, label: &'static str) -> DbResult<Self> {
        let tx = pool
            .begin_with(BEGIN_IMMEDIATE)
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(label, "Unit of work started");
        Ok(UnitOfWork { tx: Some(tx), label })
    }

    /// The transaction's connection, for executing statements.
    pub fn conn(&mut self) -> DbResult<&mut SqliteConnection> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(DbError::TransactionFailed(format!(
                "{} already finished",
                self.label
            ))),
        }
    }

    /// Commits every statement executed through this unit of work.
    pub async fn commit(mut self) -> DbResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            debug!(label = self.label, "Unit of work committed");
        }
        Ok(())
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        // sqlx queues the ROLLBACK when the transaction is dropped
        if self.tx.is_some() {
            debug!(label = self.label, "Unit of work dropped without commit, rolling back");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
