//! Employees, optionally with a login account.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use ruedas_core::entities::{Employee, EmployeeUpdate, NewEmployee};
use ruedas_core::report::DateRange;
use ruedas_core::sale::Sale;

use super::RangeQuery;
use crate::envelope::Envelope;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/empleados", get(list).post(create))
        .route("/api/empleados/{id}", get(fetch).put(update).delete(deactivate))
        .route("/api/empleados/{id}/ventas", get(sales))
}

async fn list(State(state): State<AppState>) -> ApiResult<Envelope<Vec<Employee>>> {
    Ok(Envelope::ok(state.db.employees().list().await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(employee): ApiJson<NewEmployee>,
) -> ApiResult<Envelope<Employee>> {
    let created = state.db.employees().create(&employee).await?;
    Ok(Envelope::ok(created).with_message("Employee created"))
}

async fn fetch(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Envelope<Employee>> {
    Ok(Envelope::ok(state.db.employees().get(id).await?))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<EmployeeUpdate>,
) -> ApiResult<Envelope<Employee>> {
    let employee = state.db.employees().update(id, &update).await?;
    Ok(Envelope::ok(employee).with_message("Employee updated"))
}

async fn deactivate(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Envelope<()>> {
    state.db.employees().deactivate(id).await?;
    Ok(Envelope::done("Employee deactivated"))
}

/// Without both dates, every sale of the employee.
async fn sales(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Envelope<Vec<Sale>>> {
    let range = DateRange::parse_optional(query.fecha_inicio.as_deref(), query.fecha_fin.as_deref())?;
    state.db.employees().get(id).await?;

    Ok(Envelope::ok(state.db.sales().by_employee(id, range.as_ref()).await?))
}
