//! Sales: process, cancel, look up, and the payment/sale-type catalogs.

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use ruedas_core::entities::CatalogEntry;
use ruedas_core::report::DateRange;
use ruedas_core::sale::{Sale, SaleDetail, SaleRequest};
use ruedas_db::{CancelledSale, SaleOutcome};

use super::RangeQuery;
use crate::envelope::Envelope;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::notifications::{announce_sale, announce_stock};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/ventas", get(list).post(process))
        .route("/api/ventas/metodos-pago", get(payment_methods))
        .route("/api/ventas/tipos-venta", get(sale_types))
        .route("/api/ventas/{id}", get(fetch))
        .route("/api/ventas/{id}/cancelar", post(cancel))
}

/// Without both dates, every sale in any status.
async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Envelope<Vec<Sale>>> {
    let range = DateRange::parse_optional(query.fecha_inicio.as_deref(), query.fecha_fin.as_deref())?;
    Ok(Envelope::ok(state.db.sales().list(range.as_ref()).await?))
}

async fn process(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SaleRequest>,
) -> ApiResult<Envelope<SaleOutcome>> {
    let outcome = state.db.sales().process_sale(&request, state.terms).await?;

    let client_name = match request.customer_id {
        Some(customer_id) => state.db.customers().get(customer_id).await.ok().map(|c| c.name),
        None => None,
    };
    announce_sale(&state.hub, &outcome, client_name);

    let message = format!("Sale {} processed", outcome.receipt.folio);
    Ok(Envelope::ok(outcome).with_message(message))
}

async fn fetch(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Envelope<SaleDetail>> {
    Ok(Envelope::ok(state.db.sales().get(id).await?))
}

async fn cancel(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Envelope<CancelledSale>> {
    let cancelled = state.db.sales().cancel(id).await?;

    let reason = format!("Sale {} cancelled", cancelled.folio);
    announce_stock(&state.hub, &cancelled.restocked, &reason);

    Ok(Envelope::ok(cancelled).with_message(reason))
}

async fn payment_methods(State(state): State<AppState>) -> ApiResult<Envelope<Vec<CatalogEntry>>> {
    Ok(Envelope::ok(state.db.catalog().payment_methods().await?))
}

async fn sale_types(State(state): State<AppState>) -> ApiResult<Envelope<Vec<CatalogEntry>>> {
    Ok(Envelope::ok(state.db.catalog().sale_types().await?))
}
