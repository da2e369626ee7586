//! Endpoints for approved authorities.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use crimewatch_common::AppResult;
use crimewatch_core::{
    AuthorityDashboard, ComplaintView, PincodePage,
    lifecycle::{AssignmentDecision, parse_assignment_status, parse_report_status},
};
use crimewatch_db::entities::{account, complaint_assignment, crime_report};
use serde::Deserialize;

use crate::{extractors::AuthorityUser, middleware::AppState, response::ApiResponse};

/// Pincode listing query.
#[derive(Debug, Deserialize)]
pub struct PincodeQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Status update request.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Complaint queue filter.
#[derive(Debug, Deserialize)]
pub struct AssignedQuery {
    #[serde(default)]
    pub status: Option<String>,
}

async fn crimes_by_pincode(
    AuthorityUser(_authority): AuthorityUser,
    State(state): State<AppState>,
    Path(pincode): Path<String>,
    Query(query): Query<PincodeQuery>,
) -> AppResult<ApiResponse<PincodePage>> {
    let page = state
        .report_service
        .find_by_pincode(&pincode, query.page, query.per_page)
        .await?;
    Ok(ApiResponse::ok(page))
}

/// Move a report the caller is handling to a new status.
async fn update_status(
    AuthorityUser(authority): AuthorityUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<ApiResponse<crime_report::Model>> {
    let status = parse_report_status(&req.status)?;
    let report = state
        .complaint_service
        .update_report_status(&authority, &id, status, req.feedback)
        .await?;
    Ok(ApiResponse::ok(report))
}

async fn assigned_complaints(
    AuthorityUser(authority): AuthorityUser,
    State(state): State<AppState>,
    Query(query): Query<AssignedQuery>,
) -> AppResult<ApiResponse<Vec<ComplaintView>>> {
    let status = query
        .status
        .as_deref()
        .map(parse_assignment_status)
        .transpose()?;
    let complaints = state
        .complaint_service
        .assigned_complaints(&authority.id, status)
        .await?;
    Ok(ApiResponse::ok(complaints))
}

async fn respond(
    state: &AppState,
    authority: &account::Model,
    assignment_id: &str,
    decision: AssignmentDecision,
) -> AppResult<ApiResponse<complaint_assignment::Model>> {
    let assignment = state
        .complaint_service
        .respond_to_assignment(authority, assignment_id, decision)
        .await?;
    Ok(ApiResponse::ok(assignment))
}

async fn accept_complaint(
    AuthorityUser(authority): AuthorityUser,
    State(state): State<AppState>,
    Path(assignment_id): Path<String>,
) -> AppResult<ApiResponse<complaint_assignment::Model>> {
    respond(&state, &authority, &assignment_id, AssignmentDecision::Accept).await
}

async fn reject_complaint(
    AuthorityUser(authority): AuthorityUser,
    State(state): State<AppState>,
    Path(assignment_id): Path<String>,
) -> AppResult<ApiResponse<complaint_assignment::Model>> {
    respond(&state, &authority, &assignment_id, AssignmentDecision::Reject).await
}

/// Status counters and the latest reports.
async fn dashboard(
    AuthorityUser(authority): AuthorityUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<AuthorityDashboard>> {
    let dashboard = state.analytics_service.authority_dashboard(&authority).await?;
    Ok(ApiResponse::ok(dashboard))
}

async fn pincodes(
    AuthorityUser(_authority): AuthorityUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<String>>> {
    Ok(ApiResponse::ok(state.report_service.pincodes().await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/crimes/pincode/{pincode}", get(crimes_by_pincode))
        .route("/crimes/{id}/update", post(update_status))
        .route("/assigned-complaints", get(assigned_complaints))
        .route("/complaint/{assignment_id}/accept", post(accept_complaint))
        .route("/complaint/{assignment_id}/reject", post(reject_complaint))
        .route("/dashboard", get(dashboard))
        .route("/pincodes", get(pincodes))
}
