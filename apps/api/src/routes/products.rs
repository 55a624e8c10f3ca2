//! Product catalog.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use ruedas_core::entities::{NewProduct, Product, ProductUpdate};

use crate::envelope::Envelope;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::notifications::ServerMessage;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/productos", get(list).post(create))
        .route("/api/productos/{id}", get(fetch).put(update).delete(deactivate))
}

async fn list(State(state): State<AppState>) -> ApiResult<Envelope<Vec<Product>>> {
    Ok(Envelope::ok(state.db.products().list().await?))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(product): ApiJson<NewProduct>,
) -> ApiResult<Envelope<Product>> {
    let created = state.db.products().create(&product).await?;
    state.hub.broadcast(ServerMessage::product_created(&created));

    Ok(Envelope::ok(created).with_message("Product created"))
}

async fn fetch(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Envelope<Product>> {
    Ok(Envelope::ok(state.db.products().get(id).await?))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> ApiResult<Envelope<Product>> {
    let product = state.db.products().update(id, &update).await?;
    Ok(Envelope::ok(product).with_message("Product updated"))
}

async fn deactivate(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Envelope<()>> {
    state.db.products().deactivate(id).await?;
    Ok(Envelope::done("Product deactivated"))
}
