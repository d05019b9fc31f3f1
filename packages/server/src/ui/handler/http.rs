//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{RoomDetailDto, UserDetailDto},
    ui::state::AppState,
};
use idobata_shared::time::timestamp_to_jst_rfc3339;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get the list of connected users
pub async fn get_users(State(state): State<Arc<AppState>>) -> Json<Vec<UserDetailDto>> {
    let users = state.router.users().await;

    // Domain Model から DTO への変換
    let user_details: Vec<UserDetailDto> = users
        .into_iter()
        .map(|user| UserDetailDto {
            id: user.id.as_str().to_string(),
            username: user.username.as_str().to_string(),
            room_id: user.current_room.map(|room| room.as_str().to_string()),
        })
        .collect();

    Json(user_details)
}

/// Get the list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomDetailDto>> {
    let rooms = state.router.rooms().await;

    // Domain Model から DTO への変換
    let room_details: Vec<RoomDetailDto> = rooms
        .into_iter()
        .map(|room| RoomDetailDto {
            id: room.id.as_str().to_string(),
            name: room.name.as_str().to_string(),
            user_count: room.member_count,
            created_at: timestamp_to_jst_rfc3339(room.created_at.value()),
        })
        .collect();

    Json(room_details)
}
