//! Welcome, health and system information, plus the 404/405 fallbacks.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};

use crate::envelope::Envelope;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const SERVICE_NAME: &str = "POS Refaccionaria API";
const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api", get(welcome))
        .route("/api/health", get(health))
        .route("/api/system/info", get(system_info))
}

async fn welcome() -> Envelope<Value> {
    Envelope::ok(json!({
        "message": "Welcome to the POS Refaccionaria API",
        "documentation": "/api/health",
        "version": VERSION,
        "status": "active",
    }))
}

async fn health(State(state): State<AppState>) -> ApiResult<Envelope<Value>> {
    let database_ok = state.db.health_check().await;
    let (applied, total) = state.db.migration_status().await?;

    Ok(Envelope::ok(json!({
        "status": if database_ok { "healthy" } else { "degraded" },
        "service": SERVICE_NAME,
        "version": VERSION,
        "database": {
            "connected": database_ok,
            "migrations_applied": applied,
            "migrations_total": total,
        },
        "listeners": state.hub.listener_count(),
        "endpoints": {
            "auth": "/api/auth",
            "products": "/api/productos",
            "customers": "/api/clientes",
            "employees": "/api/empleados",
            "suppliers": "/api/proveedores",
            "sales": "/api/ventas",
            "inventory": "/api/inventario",
            "reports": "/api/reportes",
            "notifications": "/ws",
        },
    })))
}

async fn system_info(State(state): State<AppState>) -> Envelope<Value> {
    Envelope::ok(json!({
        "name": SERVICE_NAME,
        "version": VERSION,
        "description": "Point of sale system for a bicycle parts store",
        "database": {
            "type": "SQLite",
            "name": state.config.db_name,
        },
        "debug": state.config.debug,
        "features": [
            "Product catalog",
            "Cash and credit sales",
            "Inventory ledger with audits",
            "Customer credit",
            "Sales reports",
            "Real-time notifications",
        ],
        "modules": [
            "auth",
            "productos",
            "clientes",
            "empleados",
            "proveedores",
            "ventas",
            "inventario",
            "reportes",
        ],
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Endpoint not found".to_string())
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
