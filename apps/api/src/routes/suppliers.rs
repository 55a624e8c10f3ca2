//! Suppliers.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use ruedas_core::entities::{NewSupplier, Supplier};

use crate::envelope::Envelope;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/proveedores", get(list).post(create))
        .route("/api/proveedores/{id}", get(fetch))
}

async fn list(State(state): State<AppState>) -> ApiResult<Envelope<Vec<Supplier>>> {
    Ok(Envelope::ok(state.db.suppliers().list().await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(supplier): ApiJson<NewSupplier>,
) -> ApiResult<Envelope<Supplier>> {
    let created = state.db.suppliers().create(&supplier).await?;
    Ok(Envelope::ok(created).with_message("Supplier created"))
}

async fn fetch(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Envelope<Supplier>> {
    Ok(Envelope::ok(state.db.suppliers().get(id).await?))
}
