//! Stock levels, movement history, adjustments and inbound receipts.

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use ruedas_core::entities::{MovementRecord, Product};
use ruedas_core::report::DateRange;
use ruedas_core::stock::{AdjustmentRequest, EntryRequest, StockAudit, StockLevel};
use ruedas_db::AdjustmentOutcome;
use serde::Serialize;

use super::RangeQuery;
use crate::envelope::Envelope;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::notifications::announce_stock;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/inventario/productos/{id}/stock", get(stock))
        .route("/api/inventario/productos/{id}/movimientos", get(movements))
        .route("/api/inventario/productos/{id}/auditoria", get(audit))
        .route("/api/inventario/stock-bajo", get(low_stock))
        .route("/api/inventario/ajustar", post(adjust))
        .route("/api/inventario/entrada", post(entry))
}

#[derive(Debug, Serialize)]
struct EntryResponse {
    movement: MovementRecord,
    stock: StockLevel,
}

async fn stock(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Envelope<StockLevel>> {
    Ok(Envelope::ok(state.db.inventory().stock(id).await?))
}

async fn movements(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Envelope<Vec<MovementRecord>>> {
    let range = DateRange::parse_optional(query.fecha_inicio.as_deref(), query.fecha_fin.as_deref())?;
    let inventory = state.db.inventory();

    // 404 for unknown products rather than an empty history
    inventory.stock(id).await?;
    Ok(Envelope::ok(inventory.movements(id, range.as_ref()).await?))
}

async fn audit(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Envelope<StockAudit>> {
    Ok(Envelope::ok(state.db.inventory().audit(id).await?))
}

async fn low_stock(State(state): State<AppState>) -> ApiResult<Envelope<Vec<Product>>> {
    Ok(Envelope::ok(state.db.inventory().low_stock().await?))
}

async fn adjust(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AdjustmentRequest>,
) -> ApiResult<Envelope<AdjustmentOutcome>> {
    let outcome = state.db.inventory().adjust(&request).await?;

    if let AdjustmentOutcome::Applied { level, .. } = &outcome {
        announce_stock(&state.hub, std::slice::from_ref(level), "Inventory adjustment");
    }

    let message = outcome.message();
    Ok(Envelope::ok(outcome).with_message(message))
}

async fn entry(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EntryRequest>,
) -> ApiResult<Envelope<EntryResponse>> {
    let (movement, stock) = state.db.inventory().entry(&request).await?;
    announce_stock(&state.hub, std::slice::from_ref(&stock), "Inventory entry");

    let message = format!("Entry recorded: {} units", request.quantity);
    Ok(Envelope::ok(EntryResponse { movement, stock }).with_message(message))
}
