//! Room endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;

use crate::{
    error::{AppError, AppResult},
    models::room::{CreateRoom, Room, RoomQuery},
};

/// Register a room
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoom,
    responses(
        (status = 201, description = "Room created", body = Room),
        (status = 400, description = "Missing or invalid name or capacity", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_room(
    State(state): State<crate::AppState>,
    WithRejection(Json(data), _): WithRejection<Json<CreateRoom>, AppError>,
) -> AppResult<(StatusCode, Json<Room>)> {
    let room = state.services.rooms.create_room(data).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// List rooms
#[utoipa::path(
    get,
    path = "/rooms",
    tag = "rooms",
    params(RoomQuery),
    responses(
        (status = 200, description = "Rooms matching the filter", body = Vec<Room>)
    )
)]
pub async fn list_rooms(
    State(state): State<crate::AppState>,
    WithRejection(Query(query), _): WithRejection<Query<RoomQuery>, AppError>,
) -> AppResult<Json<Vec<Room>>> {
    let rooms = state.services.rooms.list_rooms(&query).await?;
    Ok(Json(rooms))
}
