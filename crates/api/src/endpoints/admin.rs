//! Admin console endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use crimewatch_common::{AppError, AppResult};
use crimewatch_core::{
    ActiveArea, AssignmentOutcome, ComplaintView, CrimeAnalytics, DashboardStats, ExportKind,
    TimeRange,
    lifecycle::{parse_assignment_status, parse_report_status},
};
use crimewatch_db::entities::{account::AccountRole, crime_report};
use serde::Deserialize;

use crate::{
    endpoints::{authority::UpdateStatusRequest, users::AccountResponse},
    extractors::AdminUser,
    middleware::AppState,
    response::ApiResponse,
};

const fn default_limit() -> u64 {
    20
}

const MAX_LIMIT: u64 = 100;

/// Analytics query.
#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub time_range: Option<String>,
}

/// Active areas query.
#[derive(Debug, Deserialize)]
pub struct ActiveAreasQuery {
    pub limit: Option<u64>,
}

/// Account listing query.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Block state change.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub blocked: bool,
}

/// Complaint listing query.
#[derive(Debug, Deserialize)]
pub struct ListComplaintsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Manual assignment. Without `authority_id` the report is auto-routed.
#[derive(Debug, Default, Deserialize)]
pub struct AssignRequest {
    #[serde(default)]
    pub authority_id: Option<String>,
}

/// CSV export request.
#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

async fn dashboard_stats(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardStats>> {
    Ok(ApiResponse::ok(
        state.analytics_service.dashboard_stats().await?,
    ))
}

async fn analytics(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<ApiResponse<CrimeAnalytics>> {
    let time_range = query
        .time_range
        .as_deref()
        .map(str::parse::<TimeRange>)
        .transpose()?
        .unwrap_or_default();
    let analytics = state.analytics_service.crime_analytics(time_range).await?;
    Ok(ApiResponse::ok(analytics))
}

async fn active_areas(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ActiveAreasQuery>,
) -> AppResult<ApiResponse<Vec<ActiveArea>>> {
    let areas = state.analytics_service.active_areas(query.limit).await?;
    Ok(ApiResponse::ok(areas))
}

async fn list_users(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<ApiResponse<Vec<AccountResponse>>> {
    let role = query
        .role
        .as_deref()
        .map(str::parse::<AccountRole>)
        .transpose()
        .map_err(AppError::Validation)?;

    let accounts = state
        .account_service
        .list(role, query.limit.min(MAX_LIMIT), query.offset)
        .await?;
    Ok(ApiResponse::ok(
        accounts.into_iter().map(Into::into).collect(),
    ))
}

/// Block or unblock an account.
async fn set_user_status(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> AppResult<ApiResponse<AccountResponse>> {
    let account = state.account_service.set_blocked(&id, req.blocked).await?;
    tracing::info!(
        admin = %admin.id,
        account = %id,
        blocked = req.blocked,
        "Admin changed account status"
    );
    Ok(ApiResponse::ok(account.into()))
}

async fn list_authorities(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<AccountResponse>>> {
    let authorities = state.account_service.list_authorities(Some(true)).await?;
    Ok(ApiResponse::ok(
        authorities.into_iter().map(Into::into).collect(),
    ))
}

/// Authorities waiting for approval.
async fn authority_requests(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<AccountResponse>>> {
    let pending = state.account_service.list_authorities(Some(false)).await?;
    Ok(ApiResponse::ok(pending.into_iter().map(Into::into).collect()))
}

async fn approve_authority(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<AccountResponse>> {
    let account = state.account_service.approve_authority(&id).await?;
    Ok(ApiResponse::ok(account.into()))
}

async fn list_complaints(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ListComplaintsQuery>,
) -> AppResult<ApiResponse<Vec<ComplaintView>>> {
    let status = query
        .status
        .as_deref()
        .map(parse_assignment_status)
        .transpose()?;
    let complaints = state
        .complaint_service
        .list_assignments(status, query.limit.min(MAX_LIMIT), query.offset)
        .await?;
    Ok(ApiResponse::ok(complaints))
}

/// Assign a report to an authority, or route it when none is named.
async fn assign(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Option<Json<AssignRequest>>,
) -> AppResult<ApiResponse<AssignmentOutcome>> {
    let req = req.map(|Json(req)| req).unwrap_or_default();

    let outcome = match req.authority_id {
        Some(authority_id) => {
            state
                .complaint_service
                .assign_complaint(&id, &authority_id)
                .await?
        }
        None => state
            .complaint_service
            .route_report(&id)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("No eligible authority for report {id}")))?,
    };

    tracing::info!(
        admin = %admin.id,
        report = %id,
        authority = %outcome.assignment.authority_id,
        "Admin assigned complaint"
    );

    Ok(ApiResponse::created(outcome))
}

async fn update_status(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<ApiResponse<crime_report::Model>> {
    let status = parse_report_status(&req.status)?;
    let report = state
        .complaint_service
        .update_report_status(&admin, &id, status, req.feedback)
        .await?;
    Ok(ApiResponse::ok(report))
}

/// Download users or reports as a CSV attachment.
async fn export(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    req: Option<Json<ExportRequest>>,
) -> AppResult<Response> {
    let kind = req
        .and_then(|Json(req)| req.kind)
        .as_deref()
        .map(str::parse::<ExportKind>)
        .transpose()?
        .unwrap_or_default();

    let csv = state.export_service.export_csv(kind).await?;
    tracing::info!(admin = %admin.id, kind = kind.as_str(), "Admin exported data");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", kind.file_name()),
            ),
        ],
        csv,
    )
        .into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/analytics", get(analytics))
        .route("/active-areas", get(active_areas))
        .route("/users", get(list_users))
        .route("/users/{id}/status", patch(set_user_status))
        .route("/authorities", get(list_authorities))
        .route("/authorities/requests", get(authority_requests))
        .route("/authorities/{id}/approve", post(approve_authority))
        .route("/complaints", get(list_complaints))
        .route("/export", post(export))
        .route("/crimes/{id}/assign", post(assign))
        .route("/crimes/{id}/update", post(update_status))
}
