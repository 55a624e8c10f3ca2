//! # Repository Module
//!
//! One repository per aggregate, each a cheap clone of the pool.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Route handler                                                          │
//! │       │  db.sales().process_sale(&request, terms)                       │
//! │       ▼                                                                 │
//! │  SaleRepository ──► UnitOfWork ──► ledger::record_movement              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! │                                                                         │
//! │  Catalog:  ProductRepository, CatalogRepository                        │
//! │  People:   CustomerRepository, EmployeeRepository, SupplierRepository,  │
//! │            UserRepository                                               │
//! │  Stock:    InventoryRepository                                          │
//! │  Sales:    SaleRepository, ReportRepository                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `contact` holds the phone/email/address rows shared by customers,
//! employees and suppliers.

pub mod catalog;
pub(crate) mod contact;
pub mod customer;
pub mod employee;
pub mod inventory;
pub mod product;
pub mod report;
pub mod sale;
pub mod supplier;
pub mod user;
