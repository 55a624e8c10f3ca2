//! # Entities
//!
//! Records read from the store and the payloads that create or patch them.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Record (read)          Input (write)            Patch (update)         │
//! │  ──────────────         ─────────────            ──────────────         │
//! │  Product                NewProduct               ProductUpdate          │
//! │  Customer               NewCustomer              CustomerUpdate         │
//! │  Employee               NewEmployee              EmployeeUpdate         │
//! │  Supplier               NewSupplier              -                      │
//! │                                                                         │
//! │  Contact rows (phone, email, address) are flattened into the JSON of   │
//! │  the owning record: { "name": ..., "phone": ..., "city": ... }          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records carry the joined display names (brand, employee, etc.) so the
//! front-end never needs a second lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{GeneralStatus, MovementKind, StockDirection};
use crate::validation::{
    validate_amount_cents, validate_email, validate_id, validate_name, validate_required,
    validate_rfc, ValidationResult,
};

const NAME_MAX: usize = 150;

// =============================================================================
// Contact
// =============================================================================

/// Phone, email and address joined onto a customer, employee or supplier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Contact {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub street: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

/// Contact data submitted with a create request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewContact {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl NewContact {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(email) = non_blank(&self.email) {
            validate_email(email)?;
        }
        Ok(())
    }

    /// Whether any address field was supplied.
    pub fn has_address(&self) -> bool {
        [
            &self.street,
            &self.neighborhood,
            &self.city,
            &self.state,
            &self.postal_code,
        ]
        .iter()
        .any(|f| non_blank(f).is_some())
    }
}

/// Returns the trimmed value when present and not blank.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Product
// =============================================================================

/// A bicycle part in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
    pub stock_min: i64,
    pub stock_max: i64,
    pub brand_id: Option<i64>,
    pub brand_name: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub unit_id: Option<i64>,
    pub unit_name: Option<String>,
    /// Value of the stock counter at read time.
    pub current_stock: i64,
    pub status: GeneralStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// At or below the configured minimum.
    pub fn is_low_stock(&self) -> bool {
        crate::stock::is_low(self.current_stock, self.stock_min)
    }
}

/// Payload for `POST /api/productos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
    #[serde(default)]
    pub stock_min: i64,
    #[serde(default)]
    pub stock_max: i64,
    #[serde(default)]
    pub brand_id: Option<i64>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub unit_id: Option<i64>,
}

impl NewProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, NAME_MAX)?;
        validate_amount_cents("purchase_price_cents", self.purchase_price_cents)?;
        validate_amount_cents("sale_price_cents", self.sale_price_cents)?;
        validate_stock_bounds(self.stock_min, self.stock_max)
    }
}

/// Partial update for `PUT /api/productos/{id}`; absent fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub purchase_price_cents: Option<i64>,
    pub sale_price_cents: Option<i64>,
    pub stock_min: Option<i64>,
    pub stock_max: Option<i64>,
    pub brand_id: Option<i64>,
    pub category_id: Option<i64>,
    pub unit_id: Option<i64>,
}

impl ProductUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name, NAME_MAX)?;
        }
        if let Some(cents) = self.purchase_price_cents {
            validate_amount_cents("purchase_price_cents", cents)?;
        }
        if let Some(cents) = self.sale_price_cents {
            validate_amount_cents("sale_price_cents", cents)?;
        }
        if let Some(min) = self.stock_min {
            validate_amount_cents("stock_min", min)?;
        }
        if let Some(max) = self.stock_max {
            validate_amount_cents("stock_max", max)?;
        }
        Ok(())
    }
}

/// `stock_max` of 0 means "no maximum".
fn validate_stock_bounds(min: i64, max: i64) -> ValidationResult<()> {
    validate_amount_cents("stock_min", min)?;
    validate_amount_cents("stock_max", max)?;
    if max > 0 && max < min {
        return Err(ValidationError::OutOfRange {
            field: "stock_max".to_string(),
            min,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub rfc: Option<String>,
    pub credit_limit_cents: i64,
    /// Running balance owed on credit sales. May exceed the limit.
    pub balance_cents: i64,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub contact: Contact,
    pub status: GeneralStatus,
    #[ts(as = "String")]
    pub registered_at: DateTime<Utc>,
}

impl Customer {
    /// Credit still available; negative when the customer is over limit.
    pub fn available_credit(&self) -> Money {
        Money::from_cents(self.credit_limit_cents) - Money::from_cents(self.balance_cents)
    }
}

/// Response of `GET /api/clientes/{id}/credito`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreditSummary {
    pub customer_id: i64,
    pub name: String,
    pub credit_limit_cents: i64,
    pub balance_cents: i64,
    pub available_credit_cents: i64,
}

impl From<&Customer> for CreditSummary {
    fn from(c: &Customer) -> Self {
        CreditSummary {
            customer_id: c.id,
            name: c.name.clone(),
            credit_limit_cents: c.credit_limit_cents,
            balance_cents: c.balance_cents,
            available_credit_cents: c.available_credit().cents(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub rfc: Option<String>,
    #[serde(default)]
    pub credit_limit_cents: i64,
    #[serde(flatten)]
    pub contact: NewContact,
}

impl NewCustomer {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, NAME_MAX)?;
        if let Some(rfc) = non_blank(&self.rfc) {
            validate_rfc(rfc)?;
        }
        validate_amount_cents("credit_limit_cents", self.credit_limit_cents)?;
        self.contact.validate()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub rfc: Option<String>,
    pub credit_limit_cents: Option<i64>,
}

impl CustomerUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name, NAME_MAX)?;
        }
        if let Some(rfc) = non_blank(&self.rfc) {
            validate_rfc(rfc)?;
        }
        if let Some(limit) = self.credit_limit_cents {
            validate_amount_cents("credit_limit_cents", limit)?;
        }
        Ok(())
    }
}

// =============================================================================
// Employee
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name_1: String,
    pub last_name_2: Option<String>,
    /// "first last1 last2", assembled by the query.
    pub full_name: String,
    pub rfc: String,
    pub curp: Option<String>,
    pub nss: Option<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub contact: Contact,
    pub status: GeneralStatus,
}

/// Optional login created together with an employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserAccount {
    pub username: String,
    pub password: String,
    /// 1 = administrator, 2 = cashier.
    #[serde(default = "default_user_type")]
    pub user_type: i64,
}

fn default_user_type() -> i64 {
    2
}

impl NewUserAccount {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("username", &self.username, 50)?;
        if self.password.chars().count() < 6 {
            return Err(ValidationError::InvalidFormat {
                field: "password".to_string(),
                reason: "must be at least 6 characters".to_string(),
            });
        }
        if !(1..=2).contains(&self.user_type) {
            return Err(ValidationError::OutOfRange {
                field: "user_type".to_string(),
                min: 1,
                max: 2,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name_1: String,
    #[serde(default)]
    pub last_name_2: Option<String>,
    pub rfc: String,
    #[serde(default)]
    pub curp: Option<String>,
    #[serde(default)]
    pub nss: Option<String>,
    #[serde(flatten)]
    pub contact: NewContact,
    #[serde(default)]
    pub account: Option<NewUserAccount>,
}

impl NewEmployee {
    /// First name, first surname, RFC and phone are mandatory.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("first_name", &self.first_name, NAME_MAX)?;
        validate_name("last_name_1", &self.last_name_1, NAME_MAX)?;
        validate_rfc(&self.rfc)?;
        validate_required("phone", self.contact.phone.as_deref().unwrap_or(""))?;
        self.contact.validate()?;
        if let Some(account) = &self.account {
            account.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    pub first_name: Option<String>,
    pub last_name_1: Option<String>,
    pub last_name_2: Option<String>,
    pub rfc: Option<String>,
    pub curp: Option<String>,
    pub nss: Option<String>,
}

impl EmployeeUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.first_name {
            validate_name("first_name", name, NAME_MAX)?;
        }
        if let Some(name) = &self.last_name_1 {
            validate_name("last_name_1", name, NAME_MAX)?;
        }
        if let Some(rfc) = &self.rfc {
            validate_rfc(rfc)?;
        }
        Ok(())
    }
}

// =============================================================================
// Supplier
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub rfc: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub contact: Contact,
    pub status: GeneralStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub rfc: Option<String>,
    /// Product category the supplier mainly provides; defaults to 1.
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(flatten)]
    pub contact: NewContact,
}

impl NewSupplier {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, NAME_MAX)?;
        if let Some(rfc) = non_blank(&self.rfc) {
            validate_rfc(rfc)?;
        }
        if let Some(id) = self.category_id {
            validate_id("category_id", id)?;
        }
        self.contact.validate()
    }
}

// =============================================================================
// Users
// =============================================================================

/// What a successful login returns (never the hash).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub user_type: i64,
    pub employee_id: i64,
    pub active: bool,
}

// =============================================================================
// Lookups
// =============================================================================

/// A row of a lookup table (payment methods, sale types, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Ledger Records
// =============================================================================

/// One movement detail row, joined with its type and employee names.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MovementRecord {
    pub id: i64,
    pub movement_id: i64,
    pub product_id: i64,
    pub kind: MovementKind,
    pub kind_name: String,
    pub direction: StockDirection,
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub employee_id: i64,
    pub employee_name: Option<String>,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub moved_at: DateTime<Utc>,
}

/// Money owed by a customer for a credit sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Receivable {
    pub id: i64,
    pub customer_id: i64,
    pub sale_id: i64,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    pub status: GeneralStatus,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn employee_payload() -> NewEmployee {
        serde_json::from_value(serde_json::json!({
            "first_name": "Luis",
            "last_name_1": "Ramírez",
            "rfc": "RAML800101AB1",
            "phone": "4431234567",
            "city": "Morelia"
        }))
        .unwrap()
    }

    #[test]
    fn test_new_employee_flattened_contact() {
        let emp = employee_payload();
        assert_eq!(emp.contact.phone.as_deref(), Some("4431234567"));
        assert!(emp.contact.has_address());
        assert!(emp.validate().is_ok());
    }

    #[test]
    fn test_new_employee_requires_phone() {
        let mut emp = employee_payload();
        emp.contact.phone = Some("  ".to_string());
        assert!(matches!(
            emp.validate(),
            Err(ValidationError::Required { field }) if field == "phone"
        ));
    }

    #[test]
    fn test_new_product_stock_bounds() {
        let mut product = NewProduct {
            name: "Cámara 26x1.95".to_string(),
            barcode: None,
            description: None,
            purchase_price_cents: 4_000,
            sale_price_cents: 8_950,
            stock_min: 5,
            stock_max: 50,
            brand_id: None,
            category_id: None,
            unit_id: None,
        };
        assert!(product.validate().is_ok());

        product.stock_max = 2;
        assert!(product.validate().is_err());

        product.stock_max = 0;
        assert!(product.validate().is_ok());
    }

    #[test]
    fn test_customer_available_credit() {
        let customer = Customer {
            id: 1,
            name: "Taller El Pedal".to_string(),
            rfc: None,
            credit_limit_cents: 500_000,
            balance_cents: 620_000,
            contact: Contact::default(),
            status: GeneralStatus::Active,
            registered_at: Utc::now(),
        };
        assert_eq!(customer.available_credit().cents(), -120_000);
        assert_eq!(CreditSummary::from(&customer).available_credit_cents, -120_000);
    }

    #[test]
    fn test_user_account_validation() {
        let account = NewUserAccount {
            username: "caja1".to_string(),
            password: "123".to_string(),
            user_type: 2,
        };
        assert!(account.validate().is_err());
    }
}
