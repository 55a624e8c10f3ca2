//! # Contact Rows
//!
//! Phones, emails and addresses live in their own tables and are referenced
//! by customers, employees and suppliers. They are inserted inside the same
//! unit of work as the owning record.

use ruedas_core::entities::{non_blank, NewContact};
use sqlx::SqliteConnection;

use crate::error::DbResult;

/// Ids of the contact rows created for one record. `None` when the field
/// was not supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactIds {
    pub phone_id: Option<i64>,
    pub email_id: Option<i64>,
    pub address_id: Option<i64>,
}

/// LEFT JOIN clauses producing the flattened `Contact` columns for a table
/// aliased `o` with `phone_id`, `email_id` and `address_id` columns.
pub const CONTACT_JOINS: &str = r#"
    LEFT JOIN phones ph ON ph.id = o.phone_id
    LEFT JOIN emails em ON em.id = o.email_id
    LEFT JOIN addresses ad ON ad.id = o.address_id
"#;

/// Column list matching `ruedas_core::entities::Contact`.
pub const CONTACT_COLUMNS: &str = r#"
    ph.number AS phone,
    em.address AS email,
    ad.street,
    ad.neighborhood,
    ad.city,
    ad.state,
    ad.postal_code
"#;

pub async fn insert_contact(conn: &mut SqliteConnection, contact: &NewContact) -> DbResult<ContactIds> {
    let mut ids = ContactIds::default();

    if let Some(number) = non_blank(&contact.phone) {
        let id: i64 = sqlx::query_scalar("INSERT INTO phones (number) VALUES (?1) RETURNING id")
            .bind(number)
            .fetch_one(&mut *conn)
            .await?;
        ids.phone_id = Some(id);
    }

    if let Some(address) = non_blank(&contact.email) {
        let id: i64 = sqlx::query_scalar("INSERT INTO emails (address) VALUES (?1) RETURNING id")
            .bind(address)
            .fetch_one(&mut *conn)
            .await?;
        ids.email_id = Some(id);
    }

    if contact.has_address() {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO addresses (street, neighborhood, city, state, postal_code)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            "#,
        )
        .bind(non_blank(&contact.street))
        .bind(non_blank(&contact.neighborhood))
        .bind(non_blank(&contact.city))
        .bind(non_blank(&contact.state))
        .bind(non_blank(&contact.postal_code))
        .fetch_one(&mut *conn)
        .await?;
        ids.address_id = Some(id);
    }

    Ok(ids)
}
