use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::leaderboard::LeaderboardRecord,
    dto::{format_system_time, validation::validate_player_name},
    state::room::GameType,
};

/// Result submitted by a client once a game is over.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResultRequest {
    /// Display name of the player.
    #[validate(custom(function = "validate_player_name"))]
    pub player_name: String,
    /// Score reached; higher is better.
    #[validate(range(max = 100_000))]
    pub metric: u32,
    /// Minigame the score was earned in; defaults to the category race.
    #[serde(default)]
    pub game_type: Option<GameType>,
}

/// One leaderboard line.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Display name of the player.
    pub player_name: String,
    /// Score reached.
    pub metric: u32,
    /// Minigame the score was earned in.
    pub game_type: GameType,
    /// RFC 3339 timestamp of the submission.
    pub date: String,
}

impl From<LeaderboardRecord> for LeaderboardEntry {
    fn from(record: LeaderboardRecord) -> Self {
        Self {
            player_name: record.player_name,
            metric: record.metric,
            game_type: record.game_type,
            date: format_system_time(record.date),
        }
    }
}

/// Best results, highest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Ranked entries.
    pub entries: Vec<LeaderboardEntry>,
}
