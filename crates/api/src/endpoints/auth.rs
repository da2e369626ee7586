//! Registration and login endpoints.

use axum::{Json, Router, extract::State, routing::post};
use crimewatch_common::AppResult;
use crimewatch_core::{RegisterAuthorityInput, RegisterCitizenInput};
use serde::{Deserialize, Serialize};

use crate::{endpoints::users::AccountResponse, middleware::AppState, response::ApiResponse};

/// Registration response.
#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: String,
    pub username: String,
    pub is_approved: bool,
}

/// Register a citizen account.
async fn register_citizen(
    State(state): State<AppState>,
    Json(req): Json<RegisterCitizenInput>,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let account = state.account_service.register_citizen(req).await?;

    Ok(ApiResponse::created(RegisterResponse {
        id: account.id,
        username: account.username,
        is_approved: account.is_approved,
    }))
}

/// Register an authority account; an admin must approve it before use.
async fn register_authority(
    State(state): State<AppState>,
    Json(req): Json<RegisterAuthorityInput>,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let account = state.account_service.register_authority(req).await?;

    Ok(ApiResponse::created(RegisterResponse {
        id: account.id,
        username: account.username,
        is_approved: account.is_approved,
    }))
}

/// Login request. `username` also accepts the account's email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email")]
    pub username: String,
    pub password: String,
}

/// Login response.
#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: AccountResponse,
}

/// Exchange credentials for a bearer token.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let account = state
        .account_service
        .authenticate(&req.username, &req.password)
        .await?;
    let token = state.token_service.issue(&account)?;

    tracing::info!(account = %account.id, role = %account.role, "Login");

    Ok(ApiResponse::ok(LoginResponse {
        access_token: token.access_token,
        token_type: token.token_type,
        expires_in: token.expires_in,
        user: account.into(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register/citizen", post(register_citizen))
        .route("/register/authority", post(register_authority))
        .route("/login", post(login))
}
