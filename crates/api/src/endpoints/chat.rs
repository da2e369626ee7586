//! Chat endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use crimewatch_common::AppResult;
use crimewatch_core::{RoomSummary, SendMessageInput};
use crimewatch_db::entities::{chat_message, chat_room};
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Message page query.
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub since_id: Option<String>,
    pub limit: Option<u64>,
}

async fn list_rooms(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<RoomSummary>>> {
    let rooms = state.chat_service.list_rooms(&account).await?;
    Ok(ApiResponse::ok(rooms))
}

/// Get or open the room attached to a report.
async fn room_for_report(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> AppResult<ApiResponse<chat_room::Model>> {
    let room = state
        .chat_service
        .open_room_for_report(&account, &report_id)
        .await?;
    Ok(ApiResponse::ok(room))
}

async fn messages(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> AppResult<ApiResponse<Vec<chat_message::Model>>> {
    let messages = state
        .chat_service
        .get_messages(&account, &room_id, query.since_id.as_deref(), query.limit)
        .await?;
    Ok(ApiResponse::ok(messages))
}

async fn send(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<SendMessageInput>,
) -> AppResult<ApiResponse<chat_message::Model>> {
    let message = state
        .chat_service
        .send_message(&account, &room_id, &req.message)
        .await?;
    Ok(ApiResponse::created(message))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/room/crime/{report_id}", get(room_for_report))
        .route("/room/{room_id}/messages", get(messages))
        .route("/room/{room_id}/send", post(send))
}
