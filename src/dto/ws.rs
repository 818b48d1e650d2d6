use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::{
    room::{GameType, RoomStatus, WordMode},
    words::CategoryInfo,
};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
/// Events accepted from player WebSocket clients.
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Bind this connection to a seat in a room.
    JoinRoom {
        room_id: String,
        player_name: String,
    },
    /// Leave the room immediately.
    LeaveRoom {
        #[serde(default)]
        room_id: Option<String>,
        #[serde(default)]
        player_name: Option<String>,
    },
    /// Same as [`ClientMessage::LeaveRoom`], sent from in-game pages.
    PlayerLeave {
        #[serde(default)]
        room_id: Option<String>,
        #[serde(default)]
        player_name: Option<String>,
    },
    /// Host removes another player.
    KickPlayer {
        player_name: String,
        #[serde(default)]
        room_id: Option<String>,
    },
    /// Host starts the game.
    StartGame {
        #[serde(default)]
        word_mode: Option<WordMode>,
    },
    /// Host picks how drawing words are chosen.
    ChangeWordMode { word_mode: WordMode },
    /// Host switches the minigame while waiting.
    ChangeGameType { game_type: GameType },
    /// Player submits the word others will have to guess.
    SubmitWord { word: String },
    /// Player reopens their word for editing.
    StartEditingWord,
    /// Category race answer.
    SubmitAnswer { answer: String },
    /// Draw & guess attempt.
    SubmitGuess { guess: String },
    /// Stroke produced by the drawer.
    Draw { draw_data: Value },
    /// Drawer wipes the canvas.
    ClearCanvas,
    /// Post-game vote.
    PlayerReady {
        action: ReadyAction,
        #[serde(default)]
        game_type: Option<GameType>,
    },
    /// Resync: membership.
    GetRoomState {
        #[serde(default)]
        room_id: Option<String>,
    },
    /// Resync: scores.
    GetScores {
        #[serde(default)]
        room_id: Option<String>,
    },
    /// Resync: active category.
    RequestCategory {
        #[serde(default)]
        room_id: Option<String>,
    },
    /// Resync: active drawing round.
    RequestDrawingState {
        #[serde(default)]
        room_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse an inbound text frame.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Event name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join-room",
            Self::LeaveRoom { .. } => "leave-room",
            Self::PlayerLeave { .. } => "player-leave",
            Self::KickPlayer { .. } => "kick-player",
            Self::StartGame { .. } => "start-game",
            Self::ChangeWordMode { .. } => "change-word-mode",
            Self::ChangeGameType { .. } => "change-game-type",
            Self::SubmitWord { .. } => "submit-word",
            Self::StartEditingWord => "start-editing-word",
            Self::SubmitAnswer { .. } => "submit-answer",
            Self::SubmitGuess { .. } => "submit-guess",
            Self::Draw { .. } => "draw",
            Self::ClearCanvas => "clear-canvas",
            Self::PlayerReady { .. } => "player-ready",
            Self::GetRoomState { .. } => "get-room-state",
            Self::GetScores { .. } => "get-scores",
            Self::RequestCategory { .. } => "request-category",
            Self::RequestDrawingState { .. } => "request-drawing-state",
            Self::Unknown => "unknown",
        }
    }
}

/// Post-game vote cast by a player.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReadyAction {
    /// Play again.
    Ready,
    /// Leave the room.
    Leave,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
/// Events pushed to player WebSocket clients.
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RoomUpdate {
        players: Vec<PlayerSummary>,
        status: RoomStatus,
        game_type: GameType,
        host_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        word_mode: Option<WordMode>,
    },
    ScoresUpdate {
        scores: Vec<ScoreEntry>,
    },
    Countdown {
        value: u8,
    },
    CategoryStarted {
        category: CategoryInfo,
        category_number: usize,
        total_categories: usize,
        math_question: Option<MathQuestionView>,
        start_time: u64,
        time_left: u64,
        server_time: u64,
    },
    NewMathQuestion {
        math_question: MathQuestionView,
    },
    TimeSync {
        time_left: u64,
        server_time: u64,
    },
    AnswerResult {
        player_name: String,
        answer: Option<String>,
        is_correct: bool,
        is_duplicate: bool,
        new_score: u32,
    },
    WaitingForWords {
        total_players: usize,
    },
    WordsUpdate {
        ready_count: usize,
        total_players: usize,
        ready_players: Vec<String>,
        all_ready: bool,
    },
    PlayerEditingWord {
        player_name: String,
    },
    WordModeUpdated {
        word_mode: WordMode,
    },
    GameTypeChanged {
        game_type: GameType,
        old_game_type: GameType,
    },
    YourTurnToDraw {
        word: String,
        round: usize,
        total_rounds: usize,
        time_left: u64,
        server_time: u64,
        is_rejoining: bool,
    },
    SomeoneDrawing {
        drawer_name: String,
        round: usize,
        total_rounds: usize,
        time_left: u64,
        server_time: u64,
        is_rejoining: bool,
    },
    Drawing {
        draw_data: Value,
    },
    CanvasCleared,
    RestoreCanvas {
        drawings: Vec<Value>,
    },
    CorrectGuess {
        player_name: String,
        points_earned: u32,
        time_elapsed: u64,
        scores: Vec<ScoreEntry>,
    },
    WrongGuess {
        player_name: String,
        guess: String,
        remaining_guesses: u8,
    },
    GuessesUpdate {
        remaining_guesses: u8,
    },
    NoGuessesLeft,
    RoundAlreadyEnded,
    RoundEnded {
        word: String,
        drawer_name: String,
        drawer_points: u32,
        guessed_count: usize,
        total_players: usize,
        all_guessed: bool,
        scores: Vec<ScoreEntry>,
    },
    GameFinished {
        results: Vec<RankedResult>,
        room_id: String,
        host_name: String,
    },
    HostChanged {
        new_host: String,
    },
    Kicked,
    PlayerLeft {
        player_name: String,
        remaining_players: usize,
    },
    PlayerLeftPermanently {
        player_name: String,
        remaining_players: usize,
    },
    PlayerDisconnected {
        player_name: String,
    },
    PlayerRejoined {
        player_name: String,
    },
    PlayersReadyUpdate {
        players_ready: Vec<String>,
        host_game_choice: Option<GameType>,
        total_players: usize,
    },
    GameRestarting {
        room_id: String,
        game_type: GameType,
        host_name: String,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl ServerMessage {
    /// Build an `error` event.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

/// Machine-readable reason carried by `error` events.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    NotFound,
    DuplicateName,
    Full,
    AlreadyStarted,
    InvalidName,
    InvalidState,
    Malformed,
}

/// Membership entry of a `room-update`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub name: String,
    pub score: u32,
    pub connected: bool,
    pub is_host: bool,
}

/// Name and score pair.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
}

/// Final standing of one player.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RankedResult {
    pub rank: usize,
    pub name: String,
    pub score: u32,
}

/// Arithmetic prompt as shown to clients; the answer stays on the server.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MathQuestionView {
    pub question: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_kebab_case_events_with_camel_case_fields() {
        let message =
            ClientMessage::from_json_str(r#"{"type":"join-room","roomId":"AB23CD","playerName":"Alice"}"#)
                .unwrap();
        assert_eq!(
            message,
            ClientMessage::JoinRoom {
                room_id: "AB23CD".into(),
                player_name: "Alice".into(),
            }
        );
    }

    #[test]
    fn unit_events_ignore_extra_fields() {
        let message =
            ClientMessage::from_json_str(r#"{"type":"clear-canvas","roomId":"AB23CD"}"#).unwrap();
        assert_eq!(message, ClientMessage::ClearCanvas);
    }

    #[test]
    fn unknown_events_are_tolerated() {
        let message = ClientMessage::from_json_str(r#"{"type":"dance"}"#).unwrap();
        assert_eq!(message, ClientMessage::Unknown);
    }

    #[test]
    fn optional_fields_default_to_none() {
        let message = ClientMessage::from_json_str(r#"{"type":"leave-room"}"#).unwrap();
        assert_eq!(
            message,
            ClientMessage::LeaveRoom {
                room_id: None,
                player_name: None,
            }
        );
    }

    #[test]
    fn category_started_events_compare_by_content() {
        let started = |index: usize| ServerMessage::CategoryStarted {
            category: crate::state::words::CATEGORIES[index],
            category_number: index + 1,
            total_categories: 3,
            math_question: None,
            start_time: 1_000,
            time_left: 20,
            server_time: 1_000,
        };
        assert_eq!(started(0), started(0));
        assert_ne!(started(0), started(1));
    }

    #[test]
    fn outbound_events_are_tagged_by_type() {
        let value = serde_json::to_value(ServerMessage::PlayerLeft {
            player_name: "Bob".into(),
            remaining_players: 2,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({ "type": "player-left", "playerName": "Bob", "remainingPlayers": 2 })
        );

        let value = serde_json::to_value(ServerMessage::CanvasCleared).unwrap();
        assert_eq!(value, json!({ "type": "canvas-cleared" }));
    }
}
