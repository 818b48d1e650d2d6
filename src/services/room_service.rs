use tracing::info;

use crate::{
    dto::{
        room::{CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, JoinRoomResponse},
        validation::validate_room_id,
    },
    error::ServiceError,
    state::{SharedState, timing::epoch_millis},
};

/// Open a room and reserve the host seat for the creator.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<CreateRoomResponse, ServiceError> {
    let game_type = request.game_type.unwrap_or_default();
    let (room_id, _) = state.rooms().create(
        &request.player_name,
        game_type,
        state.config().rules(),
        epoch_millis(),
    )?;

    Ok(CreateRoomResponse { room_id, game_type })
}

/// Reserve a seat in an existing room ahead of the WebSocket join.
pub async fn join_room(
    state: &SharedState,
    room_id: &str,
    request: JoinRoomRequest,
) -> Result<JoinRoomResponse, ServiceError> {
    validate_room_id(room_id).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|message| message.into_owned())
                .unwrap_or_else(|| "invalid room id".into()),
        )
    })?;

    let not_found = || ServiceError::NotFound(format!("room `{room_id}` not found"));
    let handle = state.rooms().get(room_id).ok_or_else(not_found)?;
    let mut room = handle.lock().await;
    if room.closed {
        return Err(not_found());
    }

    let name = room.register(&request.player_name, epoch_millis())?;
    info!(room_id = %room.id, player = %name, "seat reserved");

    Ok(JoinRoomResponse {
        room_id: room.id.clone(),
        game_type: room.game_type(),
        players: room.players.iter().map(|player| player.name.clone()).collect(),
    })
}
