//! # Ruedas API
//!
//! HTTP/JSON server for the bicycle-parts point of sale, with a WebSocket
//! channel for real-time notifications.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Ruedas API                                    │
//! │                                                                         │
//! │  request ──► TraceLayer ──► CorsLayer ──► routes/* ──► ruedas-db        │
//! │                                              │                          │
//! │                                              │ committed sale,          │
//! │                                              │ adjustment, entry,       │
//! │                                              │ new product              │
//! │                                              ▼                          │
//! │                                      NotificationHub ──► /ws listeners  │
//! │                                                                         │
//! │  Every response: { success, data?, error?, message? }                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (a `.env` file is read first):
//! - `HOST`, `PORT` - bind address (default `0.0.0.0:5000`)
//! - `DATABASE_PATH` - SQLite file (default `pos_refaccionaria.db`)
//! - `SECRET_KEY` - JWT signing key
//! - `TAX_RATE_BPS`, `CREDIT_TERM_DAYS` - sale terms (default 1600, 30)
//!
//! See [`config::ApiConfig`] for the full list.

pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod notifications;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, ConfigError};
pub use envelope::Envelope;
pub use error::{ApiError, ApiResult};
pub use notifications::NotificationHub;
pub use routes::router;
pub use state::AppState;
