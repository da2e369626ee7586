//! Account profile endpoints.

use axum::{Router, routing::get};
use crimewatch_common::AppResult;
use crimewatch_db::entities::account::{self, AccountRole};
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Public view of an account.
#[derive(Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: AccountRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub is_approved: bool,
    pub is_blocked: bool,
    pub created_at: String,
}

impl From<account::Model> for AccountResponse {
    fn from(account: account::Model) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            full_name: account.full_name,
            role: account.role,
            badge_number: account.badge_number,
            department: account.department,
            jurisdiction: account.jurisdiction,
            phone_number: account.phone_number,
            is_approved: account.is_approved,
            is_blocked: account.is_blocked,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// The caller's own account.
async fn profile(AuthUser(account): AuthUser) -> AppResult<ApiResponse<AccountResponse>> {
    Ok(ApiResponse::ok(account.into()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(profile))
}
