//! Read-only reports over active sales.
//!
//! Every report takes `fecha_inicio` and `fecha_fin` (inclusive). When
//! either is missing the range is the last 30 days.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use ruedas_core::report::{
    DateRange, EmployeeSales, InventoryStats, PaymentMethodSales, PeriodSummary, TopProduct,
};
use ruedas_core::DEFAULT_TOP_PRODUCTS;
use serde::Serialize;

use super::RangeQuery;
use crate::envelope::Envelope;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/reportes/ventas/periodo", get(period))
        .route("/api/reportes/productos/mas-vendidos", get(top_products))
        .route("/api/reportes/ventas/empleados", get(by_employee))
        .route("/api/reportes/ventas/metodos-pago", get(by_payment_method))
        .route("/api/reportes/inventario/estadisticas", get(inventory_stats))
}

/// A report together with the range it covers.
#[derive(Debug, Serialize)]
struct RangeReport<T: Serialize> {
    #[serde(flatten)]
    range: DateRange,
    report: T,
}

fn resolve_range(query: &RangeQuery) -> ApiResult<DateRange> {
    let today = Utc::now().date_naive();
    Ok(DateRange::resolve(
        query.fecha_inicio.as_deref(),
        query.fecha_fin.as_deref(),
        today,
    )?)
}

async fn period(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Envelope<RangeReport<PeriodSummary>>> {
    let range = resolve_range(&query)?;
    let report = state.db.reports().period(&range).await?;
    Ok(Envelope::ok(RangeReport { range, report }))
}

async fn top_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Envelope<RangeReport<Vec<TopProduct>>>> {
    let range = resolve_range(&query)?;
    let limit = query.limite.unwrap_or(DEFAULT_TOP_PRODUCTS);
    if limit <= 0 {
        return Err(ApiError::bad_request("limite must be positive"));
    }

    let report = state.db.reports().top_products(&range, limit).await?;
    Ok(Envelope::ok(RangeReport { range, report }))
}

async fn by_employee(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Envelope<RangeReport<Vec<EmployeeSales>>>> {
    let range = resolve_range(&query)?;
    let report = state.db.reports().by_employee(&range).await?;
    Ok(Envelope::ok(RangeReport { range, report }))
}

async fn by_payment_method(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Envelope<RangeReport<Vec<PaymentMethodSales>>>> {
    let range = resolve_range(&query)?;
    let report = state.db.reports().by_payment_method(&range).await?;
    Ok(Envelope::ok(RangeReport { range, report }))
}

async fn inventory_stats(State(state): State<AppState>) -> ApiResult<Envelope<InventoryStats>> {
    Ok(Envelope::ok(state.db.reports().inventory_stats().await?))
}
