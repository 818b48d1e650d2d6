use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use validator::Validate;

use crate::{
    dto::room::{CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, JoinRoomResponse},
    error::AppError,
    services::room_service,
    state::SharedState,
};

/// Routes handling room bootstrap (creation & seat reservation).
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/game/create", post(create_room))
        .route("/api/game/join/{room_id}", post(join_room))
}

/// Open a new room; the creator becomes its host.
#[utoipa::path(
    post,
    path = "/api/game/create",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = CreateRoomResponse),
        (status = 400, description = "Invalid player name")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, AppError> {
    payload.validate()?;
    let created = room_service::create_room(&state, payload).await?;
    Ok(Json(created))
}

/// Reserve a seat in an existing room.
#[utoipa::path(
    post,
    path = "/api/game/join/{room_id}",
    tag = "rooms",
    params(("room_id" = String, Path, description = "Six-character room code, case-insensitive")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Seat reserved", body = JoinRoomResponse),
        (status = 400, description = "Invalid player name or room code"),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Name taken, room full or game already started")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, AppError> {
    payload.validate()?;
    let joined = room_service::join_room(&state, &room_id, payload).await?;
    Ok(Json(joined))
}
