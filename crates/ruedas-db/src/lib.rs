//! # ruedas-db: Database Layer for Ruedas POS
//!
//! SQLite access for the bicycle-parts point of sale: connection pool,
//! embedded migrations, transactions, the stock ledger and repositories.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ruedas POS Data Flow                             │
//! │                                                                         │
//! │  HTTP route (POST /api/ventas)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     ruedas-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │◄───│  SaleRepo     │    │  (embedded)  │   │   │
//! │  │   │               │    │  InventoryRepo│    │              │   │   │
//! │  │   │ SqlitePool    │    │  ...          │    │ 001_initial  │   │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘   │   │
//! │  │                                │                                │   │
//! │  │                     UnitOfWork + ledger                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (pos_refaccionaria.db)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`uow`] - Scoped transactions
//! - [`ledger`] - Stock movements and the stock counter
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ruedas_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("pos_refaccionaria.db")).await?;
//!
//! let low = db.inventory().low_stock().await?;
//! let outcome = db.sales().process_sale(&request, SaleTerms::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod uow;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::catalog::CatalogRepository;
pub use repository::customer::CustomerRepository;
pub use repository::employee::EmployeeRepository;
pub use repository::inventory::{AdjustmentOutcome, InventoryRepository};
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::{CancelledSale, SaleOutcome, SaleRepository};
pub use repository::supplier::SupplierRepository;
pub use repository::user::UserRepository;
