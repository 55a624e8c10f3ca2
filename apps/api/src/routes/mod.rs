//! # HTTP Routes
//!
//! One module per resource; each contributes a `Router<AppState>` with
//! full paths, merged here.
//!
//! ```text
//! /api                     system.rs    welcome, health, system info
//! /api/auth/...            auth.rs      login, token check
//! /api/productos/...       products.rs
//! /api/clientes/...        customers.rs
//! /api/empleados/...       employees.rs
//! /api/proveedores/...     suppliers.rs
//! /api/ventas/...          sales.rs     process, cancel, catalogs
//! /api/inventario/...      inventory.rs stock, movements, adjust, entry
//! /api/reportes/...        reports.rs
//! /ws                      notifications::socket
//! ```
//!
//! Unknown paths answer 404 and known paths with the wrong verb answer 405,
//! both in the standard envelope.

mod auth;
mod customers;
mod employees;
mod inventory;
mod products;
mod reports;
mod sales;
mod suppliers;
mod system;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ApiConfig;
use crate::notifications::ws_handler;
use crate::state::AppState;

/// Builds the complete application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(system::routes())
        .merge(auth::routes())
        .merge(products::routes())
        .merge(customers::routes())
        .merge(employees::routes())
        .merge(suppliers::routes())
        .merge(sales::routes())
        .merge(inventory::routes())
        .merge(reports::routes())
        .route("/ws", get(ws_handler))
        .fallback(system::not_found)
        .method_not_allowed_fallback(system::method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

/// `?fecha_inicio=YYYY-MM-DD&fecha_fin=YYYY-MM-DD[&limite=N]`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RangeQuery {
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
    pub limite: Option<i64>,
}
