//! # Catalog Repository
//!
//! Read-only lookup tables seeded by the initial migration.

use ruedas_core::entities::CatalogEntry;
use ruedas_core::GeneralStatus;
use sqlx::SqlitePool;

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Active payment methods.
    pub async fn payment_methods(&self) -> DbResult<Vec<CatalogEntry>> {
        let methods = sqlx::query_as::<_, CatalogEntry>(
            "SELECT id, name FROM payment_methods WHERE status_id = ?1 ORDER BY id",
        )
        .bind(GeneralStatus::Active.id())
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }

    pub async fn sale_types(&self) -> DbResult<Vec<CatalogEntry>> {
        let types = sqlx::query_as::<_, CatalogEntry>("SELECT id, name FROM sale_types ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_seeded_lookups() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let methods = catalog.payment_methods().await.unwrap();
        assert_eq!(methods[0].name, "Efectivo");
        assert_eq!(methods.len(), 3);

        let types = catalog.sale_types().await.unwrap();
        assert_eq!(types.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
    }
}
