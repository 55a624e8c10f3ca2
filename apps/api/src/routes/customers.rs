//! Customers and their credit.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use ruedas_core::entities::{CreditSummary, Customer, CustomerUpdate, NewCustomer};
use ruedas_core::sale::Sale;

use crate::envelope::Envelope;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/clientes", get(list).post(create))
        .route("/api/clientes/{id}", get(fetch).put(update).delete(deactivate))
        .route("/api/clientes/{id}/credito", get(credit))
        .route("/api/clientes/{id}/ventas", get(sales))
}

async fn list(State(state): State<AppState>) -> ApiResult<Envelope<Vec<Customer>>> {
    Ok(Envelope::ok(state.db.customers().list().await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(customer): ApiJson<NewCustomer>,
) -> ApiResult<Envelope<Customer>> {
    let created = state.db.customers().create(&customer).await?;
    Ok(Envelope::ok(created).with_message("Customer created"))
}

async fn fetch(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Envelope<Customer>> {
    Ok(Envelope::ok(state.db.customers().get(id).await?))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<CustomerUpdate>,
) -> ApiResult<Envelope<Customer>> {
    let customer = state.db.customers().update(id, &update).await?;
    Ok(Envelope::ok(customer).with_message("Customer updated"))
}

async fn deactivate(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Envelope<()>> {
    state.db.customers().deactivate(id).await?;
    Ok(Envelope::done("Customer deactivated"))
}

async fn credit(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Envelope<CreditSummary>> {
    Ok(Envelope::ok(state.db.customers().credit(id).await?))
}

async fn sales(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Envelope<Vec<Sale>>> {
    // 404 for unknown customers rather than an empty list
    state.db.customers().get(id).await?;
    Ok(Envelope::ok(state.db.sales().by_customer(id).await?))
}
