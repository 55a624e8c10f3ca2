//! Login and token inspection.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use ruedas_core::entities::AuthenticatedUser;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{extract_bearer_token, Claims};
use crate::envelope::Envelope;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(alias = "username", default)]
    usuario: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    user: AuthenticatedUser,
    access_token: String,
    token_type: &'static str,
    expires_in: i64,
}

async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Envelope<LoginResponse>> {
    let username = request.usuario.trim();
    if username.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("usuario and password are required"));
    }

    let Some(user) = state.db.users().authenticate(username, &request.password).await? else {
        return Err(ApiError::Unauthorized("Invalid username or password".to_string()));
    };

    let access_token = state.jwt.issue(&user)?;
    info!(user_id = user.user_id, username = %user.username, "User logged in");

    Ok(Envelope::ok(LoginResponse {
        user,
        access_token,
        token_type: "Bearer",
        expires_in: state.jwt.lifetime_secs(),
    })
    .with_message("Login successful"))
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Envelope<Claims>> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    Ok(Envelope::ok(state.jwt.validate(token)?))
}
