//! Crime report endpoints for citizens.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use crimewatch_common::AppResult;
use crimewatch_core::{CreateReportInput, CreatedReport, NearbyReport};
use crimewatch_db::entities::{crime_report, report_status_event};
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, CitizenUser},
    middleware::AppState,
    response::ApiResponse,
};

/// File a report.
async fn create_report(
    CitizenUser(citizen): CitizenUser,
    State(state): State<AppState>,
    Json(req): Json<CreateReportInput>,
) -> AppResult<ApiResponse<CreatedReport>> {
    let created = state.report_service.create(&citizen, req).await?;
    Ok(ApiResponse::created(created))
}

/// Nearby query.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius: Option<f64>,
}

/// Reports around a point, nearest first.
async fn nearby(
    AuthUser(_account): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> AppResult<ApiResponse<Vec<NearbyReport>>> {
    let reports = state
        .report_service
        .find_nearby(query.lat, query.lng, query.radius)
        .await?;
    Ok(ApiResponse::ok(reports))
}

/// The caller's own reports.
async fn user_history(
    CitizenUser(citizen): CitizenUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<crime_report::Model>>> {
    let reports = state.report_service.history_for(&citizen.id).await?;
    Ok(ApiResponse::ok(reports))
}

async fn get_report(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<crime_report::Model>> {
    let report = state.report_service.get_visible(&account, &id).await?;
    Ok(ApiResponse::ok(report))
}

/// Status trail of a report.
async fn status_history(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<report_status_event::Model>>> {
    let report = state.report_service.get_visible(&account, &id).await?;
    let events = state.complaint_service.status_history(&report.id).await?;
    Ok(ApiResponse::ok(events))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/report", post(create_report))
        .route("/nearby", get(nearby))
        .route("/user-history", get(user_history))
        .route("/{id}", get(get_report))
        .route("/{id}/history", get(status_history))
}
