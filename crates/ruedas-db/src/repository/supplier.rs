//! # Supplier Repository

use chrono::Utc;
use ruedas_core::entities::{non_blank, NewSupplier, Supplier};
use ruedas_core::GeneralStatus;
use sqlx::SqlitePool;
use tracing::debug;

use super::contact::{insert_contact, CONTACT_COLUMNS, CONTACT_JOINS};
use crate::error::{DbError, DbResult};
use crate::uow::UnitOfWork;

/// Category used when a supplier is created without one.
const DEFAULT_CATEGORY_ID: i64 = 1;

fn supplier_select() -> String {
    format!(
        r#"
        SELECT
            o.id,
            o.name,
            o.rfc,
            o.category_id,
            cat.name AS category_name,
            {CONTACT_COLUMNS},
            o.status_id AS status,
            o.created_at
        FROM suppliers o
        LEFT JOIN categories cat ON cat.id = o.category_id
        {CONTACT_JOINS}
        "#
    )
}

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("{} WHERE o.status_id = ?1 ORDER BY o.name", supplier_select());
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .bind(GeneralStatus::Active.id())
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    pub async fn get(&self, id: i64) -> DbResult<Supplier> {
        let sql = format!("{} WHERE o.id = ?1", supplier_select());
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    pub async fn create(&self, supplier: &NewSupplier) -> DbResult<Supplier> {
        supplier.validate()?;
        debug!(name = %supplier.name, "Creating supplier");

        let mut uow = UnitOfWork::begin(&self.pool, "create_supplier").await?;
        let contact = insert_contact(uow.conn()?, &supplier.contact).await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO suppliers (
                name, rfc, category_id,
                phone_id, email_id, address_id,
                status_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING id
            "#,
        )
        .bind(supplier.name.trim())
        .bind(non_blank(&supplier.rfc).map(str::to_uppercase))
        .bind(supplier.category_id.unwrap_or(DEFAULT_CATEGORY_ID))
        .bind(contact.phone_id)
        .bind(contact.email_id)
        .bind(contact.address_id)
        .bind(GeneralStatus::Active.id())
        .bind(Utc::now())
        .fetch_one(uow.conn()?)
        .await?;

        uow.commit().await?;

        debug!(id, "Supplier created");
        self.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use ruedas_core::entities::NewContact;

    #[tokio::test]
    async fn test_create_defaults_category() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let supplier = db
            .suppliers()
            .create(&NewSupplier {
                name: "Distribuidora Ciclista del Bajío".to_string(),
                rfc: None,
                category_id: None,
                contact: NewContact {
                    email: Some("ventas@dcb.mx".to_string()),
                    ..Default::default()
                },
            })
            .await
            .unwrap();

        assert_eq!(supplier.category_id, Some(1));
        assert_eq!(supplier.category_name.as_deref(), Some("General"));
        assert_eq!(supplier.contact.email.as_deref(), Some("ventas@dcb.mx"));
        assert_eq!(db.suppliers().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db
            .suppliers()
            .create(&NewSupplier {
                name: "Sin categoría".to_string(),
                rfc: None,
                category_id: Some(99),
                contact: NewContact::default(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
