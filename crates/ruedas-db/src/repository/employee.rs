//! # Employee Repository
//!
//! Employees, their contact rows and (optionally) their login account,
//! created together in one unit of work.

use chrono::Utc;
use ruedas_core::entities::{non_blank, Employee, EmployeeUpdate, NewEmployee};
use ruedas_core::GeneralStatus;
use sqlx::SqlitePool;
use tracing::debug;

use super::contact::{insert_contact, CONTACT_COLUMNS, CONTACT_JOINS};
use super::user::{hash_password, insert_user};
use crate::error::{DbError, DbResult};
use crate::uow::UnitOfWork;

fn employee_select() -> String {
    format!(
        r#"
        SELECT
            o.id,
            o.first_name,
            o.last_name_1,
            o.last_name_2,
            TRIM(o.first_name || ' ' || o.last_name_1 || ' ' || COALESCE(o.last_name_2, '')) AS full_name,
            o.rfc,
            o.curp,
            o.nss,
            {CONTACT_COLUMNS},
            o.status_id AS status
        FROM employees o
        {CONTACT_JOINS}
        "#
    )
}

#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// Active employees ordered by first surname.
    pub async fn list(&self) -> DbResult<Vec<Employee>> {
        let sql = format!(
            "{} WHERE o.status_id = ?1 ORDER BY o.last_name_1, o.first_name",
            employee_select()
        );
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .bind(GeneralStatus::Active.id())
            .fetch_all(&self.pool)
            .await?;

        Ok(employees)
    }

    pub async fn get(&self, id: i64) -> DbResult<Employee> {
        let sql = format!("{} WHERE o.id = ?1", employee_select());
        sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Employee", id))
    }

    /// Creates the employee, its contact rows and its optional account.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username already taken (nothing is kept)
    pub async fn create(&self, employee: &NewEmployee) -> DbResult<Employee> {
        employee.validate()?;
        debug!(first_name = %employee.first_name, "Creating employee");

        // Hashing is slow; do it before the transaction holds a connection
        let password_hash = match &employee.account {
            Some(account) => Some(hash_password(&account.password)?),
            None => None,
        };

        let mut uow = UnitOfWork::begin(&self.pool, "create_employee").await?;
        let contact = insert_contact(uow.conn()?, &employee.contact).await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO employees (
                first_name, last_name_1, last_name_2,
                rfc, curp, nss,
                phone_id, email_id, address_id,
                status_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            RETURNING id
            "#,
        )
        .bind(employee.first_name.trim())
        .bind(employee.last_name_1.trim())
        .bind(non_blank(&employee.last_name_2))
        .bind(employee.rfc.trim().to_uppercase())
        .bind(non_blank(&employee.curp).map(str::to_uppercase))
        .bind(non_blank(&employee.nss))
        .bind(contact.phone_id)
        .bind(contact.email_id)
        .bind(contact.address_id)
        .bind(GeneralStatus::Active.id())
        .bind(Utc::now())
        .fetch_one(uow.conn()?)
        .await?;

        if let (Some(account), Some(hash)) = (&employee.account, &password_hash) {
            insert_user(uow.conn()?, id, account, hash).await?;
        }

        uow.commit().await?;

        debug!(id, "Employee created");
        self.get(id).await
    }

    pub async fn update(&self, id: i64, update: &EmployeeUpdate) -> DbResult<Employee> {
        update.validate()?;
        debug!(id, "Updating employee");

        let result = sqlx::query(
            r#"
            UPDATE employees SET
                first_name = COALESCE(?2, first_name),
                last_name_1 = COALESCE(?3, last_name_1),
                last_name_2 = COALESCE(?4, last_name_2),
                rfc = COALESCE(?5, rfc),
                curp = COALESCE(?6, curp),
                nss = COALESCE(?7, nss)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.first_name.as_deref().map(str::trim))
        .bind(update.last_name_1.as_deref().map(str::trim))
        .bind(non_blank(&update.last_name_2))
        .bind(update.rfc.as_deref().map(|r| r.trim().to_uppercase()))
        .bind(non_blank(&update.curp).map(str::to_uppercase))
        .bind(non_blank(&update.nss))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }

        self.get(id).await
    }

    /// Soft delete. The employee's login is disabled in the same unit of work.
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deactivating employee");

        let mut uow = UnitOfWork::begin(&self.pool, "deactivate_employee").await?;

        let result = sqlx::query("UPDATE employees SET status_id = ?2 WHERE id = ?1")
            .bind(id)
            .bind(GeneralStatus::Inactive.id())
            .execute(uow.conn()?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }

        sqlx::query("UPDATE users SET active = 0 WHERE employee_id = ?1")
            .bind(id)
            .execute(uow.conn()?)
            .await?;

        uow.commit().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
