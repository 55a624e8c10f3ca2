//! # Customer Repository
//!
//! Customers and their credit position. The running balance is raised by
//! credit sales and lowered by their cancellation; both happen in
//! [`SaleRepository`](super::sale::SaleRepository), never here.

use chrono::Utc;
use ruedas_core::entities::{non_blank, CreditSummary, Customer, CustomerUpdate, NewCustomer};
use ruedas_core::GeneralStatus;
use sqlx::SqlitePool;
use tracing::debug;

use super::contact::{insert_contact, CONTACT_COLUMNS, CONTACT_JOINS};
use crate::error::{DbError, DbResult};
use crate::uow::UnitOfWork;

fn customer_select() -> String {
    format!(
        r#"
        SELECT
            o.id,
            o.name,
            o.rfc,
            o.credit_limit_cents,
            o.balance_cents,
            {CONTACT_COLUMNS},
            o.status_id AS status,
            o.registered_at
        FROM customers o
        {CONTACT_JOINS}
        "#
    )
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Active customers ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let sql = format!("{} WHERE o.status_id = ?1 ORDER BY o.name", customer_select());
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(GeneralStatus::Active.id())
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    pub async fn get(&self, id: i64) -> DbResult<Customer> {
        let sql = format!("{} WHERE o.id = ?1", customer_select());
        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Inserts the contact rows and the customer in one unit of work.
    pub async fn create(&self, customer: &NewCustomer) -> DbResult<Customer> {
        customer.validate()?;
        debug!(name = %customer.name, "Creating customer");

        let mut uow = UnitOfWork::begin(&self.pool, "create_customer").await?;
        let contact = insert_contact(uow.conn()?, &customer.contact).await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO customers (
                name, rfc, credit_limit_cents, balance_cents,
                phone_id, email_id, address_id,
                status_id, registered_at
            ) VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?7, ?8)
            RETURNING id
            "#,
        )
        .bind(customer.name.trim())
        .bind(non_blank(&customer.rfc).map(str::to_uppercase))
        .bind(customer.credit_limit_cents)
        .bind(contact.phone_id)
        .bind(contact.email_id)
        .bind(contact.address_id)
        .bind(GeneralStatus::Active.id())
        .bind(Utc::now())
        .fetch_one(uow.conn()?)
        .await?;

        uow.commit().await?;

        debug!(id, "Customer created");
        self.get(id).await
    }

    /// Updates name, RFC and credit limit. The balance is not editable.
    pub async fn update(&self, id: i64, update: &CustomerUpdate) -> DbResult<Customer> {
        update.validate()?;
        debug!(id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = COALESCE(?2, name),
                rfc = COALESCE(?3, rfc),
                credit_limit_cents = COALESCE(?4, credit_limit_cents)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(non_blank(&update.rfc).map(str::to_uppercase))
        .bind(update.credit_limit_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.get(id).await
    }

    /// Soft delete. Open receivables are left untouched.
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deactivating customer");

        let result = sqlx::query("UPDATE customers SET status_id = ?2 WHERE id = ?1")
            .bind(id)
            .bind(GeneralStatus::Inactive.id())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Limit, balance and available credit.
    pub async fn credit(&self, id: i64) -> DbResult<CreditSummary> {
        let customer = self.get(id).await?;
        Ok(CreditSummary::from(&customer))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use ruedas_core::entities::NewContact;

    fn new_customer() -> NewCustomer {
        NewCustomer {
            name: "Taller El Pedal".to_string(),
            rfc: Some("tep990101ab1".to_string()),
            credit_limit_cents: 500_000,
            contact: NewContact {
                phone: Some("4431112233".to_string()),
                email: Some("taller@elpedal.mx".to_string()),
                city: Some("Morelia".to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_create_with_contact() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let customer = db.customers().create(&new_customer()).await.unwrap();

        assert_eq!(customer.rfc.as_deref(), Some("TEP990101AB1"));
        assert_eq!(customer.contact.phone.as_deref(), Some("4431112233"));
        assert_eq!(customer.contact.email.as_deref(), Some("taller@elpedal.mx"));
        assert_eq!(customer.contact.city.as_deref(), Some("Morelia"));
        assert_eq!(customer.balance_cents, 0);
    }

    #[tokio::test]
    async fn test_update_limit_and_credit_summary() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();
        let customer = repo.create(&new_customer()).await.unwrap();

        repo.update(
            customer.id,
            &CustomerUpdate {
                credit_limit_cents: Some(800_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let credit = repo.credit(customer.id).await.unwrap();
        assert_eq!(credit.credit_limit_cents, 800_000);
        assert_eq!(credit.available_credit_cents, 800_000);
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();
        let customer = repo.create(&new_customer()).await.unwrap();

        repo.deactivate(customer.id).await.unwrap();

        assert!(repo.list().await.unwrap().is_empty());
        assert_eq!(repo.get(customer.id).await.unwrap().status, GeneralStatus::Inactive);
    }
}
