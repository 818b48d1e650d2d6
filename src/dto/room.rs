use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dto::validation::validate_player_name, state::room::GameType};

/// Payload used to open a new room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    /// Display name of the creator, who becomes host.
    #[validate(custom(function = "validate_player_name"))]
    pub player_name: String,
    /// Minigame to play first; defaults to the category race.
    #[serde(default)]
    pub game_type: Option<GameType>,
}

/// Room opened by [`CreateRoomRequest`].
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    /// Six-character code to share with the other players.
    pub room_id: String,
    /// Minigame selected for the room.
    pub game_type: GameType,
}

/// Payload used to reserve a seat in an existing room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    /// Display name, unique within the room ignoring case.
    #[validate(custom(function = "validate_player_name"))]
    pub player_name: String,
}

/// Seat reserved through [`JoinRoomRequest`].
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomResponse {
    /// Canonical room code.
    pub room_id: String,
    /// Minigame currently selected for the room.
    pub game_type: GameType,
    /// Names of every seated player in join order.
    pub players: Vec<String>,
}
