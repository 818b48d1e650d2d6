//! Room aggregate: membership, host authority, resync payloads and timer dispatch.
//!
//! Game-mode specific behaviour lives in [`super::categories`], [`super::drawing`]
//! and [`super::rematch`], all implemented on [`Room`].

use std::time::Duration;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{
    config::GameRules,
    dto::{
        validation::player_name_problem,
        ws::{PlayerSummary, RankedResult, ScoreEntry, ServerMessage},
    },
    state::{
        categories::CategoryRace,
        drawing::DrawGuess,
        outbox::{ConnId, Outbox, Recipient, TimerPurpose},
        text::{name_key, tidy_name},
        timing::remaining_secs,
    },
};

/// Lifecycle of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Lobby: players join, the host configures.
    Waiting,
    /// A game is running.
    Playing,
    /// Results are shown and rematch votes collected.
    Finished,
}

/// Minigame played in a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    /// Timed word-category race.
    #[default]
    Categories,
    /// Sequential draw and guess.
    Drawing,
}

/// How drawing words are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WordMode {
    /// Every player submits the word they will draw.
    #[default]
    Player,
    /// Words are drawn from the built-in list.
    Random,
}

/// Reasons a join attempt is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinError {
    /// An active player already uses this name.
    #[error("this name is already taken in the room")]
    DuplicateName,
    /// Every seat is taken.
    #[error("the room is full")]
    RoomFull,
    /// New seats are only handed out while waiting.
    #[error("the game has already started")]
    AlreadyStarted,
    /// The name does not satisfy the naming rules.
    #[error("invalid player name: {0}")]
    InvalidName(&'static str),
}

/// One seat in a room.
#[derive(Debug, Clone)]
pub struct Player {
    /// Display name, unique per room ignoring case.
    pub name: String,
    /// Live connection, `None` while unbound.
    pub connection_id: Option<ConnId>,
    /// Score of the current game.
    pub score: u32,
    /// Wrong guesses left in the current drawing round.
    pub remaining_guesses: u8,
    /// Last inbound activity (epoch ms).
    pub last_activity: u64,
    /// End of the disconnect grace window, while one is pending.
    pub pending_disconnect_deadline: Option<u64>,
    /// Whether a connection was ever bound to this seat.
    pub has_connected: bool,
}

impl Player {
    fn new(name: String, guesses: u8, now: u64) -> Self {
        Self {
            name,
            connection_id: None,
            score: 0,
            remaining_guesses: guesses,
            last_activity: now,
            pending_disconnect_deadline: None,
            has_connected: false,
        }
    }

    /// Case-insensitive identity.
    pub fn key(&self) -> String {
        name_key(&self.name)
    }

    /// Connected and not waiting out a grace window.
    pub fn is_active(&self) -> bool {
        self.connection_id.is_some() && self.pending_disconnect_deadline.is_none()
    }
}

/// Mode-specific state; its variant always matches the room's game type.
#[derive(Debug, Clone)]
pub enum ModeState {
    /// Category race state.
    Categories(CategoryRace),
    /// Draw & guess state.
    Drawing(DrawGuess),
}

impl ModeState {
    /// Fresh state for `game_type`.
    pub fn new(game_type: GameType) -> Self {
        match game_type {
            GameType::Categories => ModeState::Categories(CategoryRace::default()),
            GameType::Drawing => ModeState::Drawing(DrawGuess::default()),
        }
    }
}

/// How a player left the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Departure {
    Left,
    Kicked,
    TimedOut,
}

/// One isolated game session.
#[derive(Debug, Clone)]
pub struct Room {
    /// Six-character room code.
    pub id: String,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Seats in join order.
    pub players: Vec<Player>,
    /// Name of the player holding host authority.
    pub host_name: String,
    /// Creation time (epoch ms).
    pub created_at: u64,
    /// Last inbound activity on the room (epoch ms), drives idle expiry.
    pub last_activity: u64,
    /// Game type chosen by the host for the rematch.
    pub next_game_type: Option<GameType>,
    /// Names of players who voted for a rematch.
    pub players_ready: IndexSet<String>,
    /// Active game-mode state.
    pub mode: ModeState,
    /// Start of the active timed phase (epoch ms).
    pub phase_started_at: Option<u64>,
    /// Limits and durations.
    pub rules: GameRules,
    /// Set once the room left the store; late handlers holding it must no-op.
    pub closed: bool,
}

impl Room {
    /// Create a room whose host seat is reserved for `host_name` until they connect.
    pub fn new(
        id: String,
        host_name: &str,
        game_type: GameType,
        rules: GameRules,
        now: u64,
    ) -> Result<Self, JoinError> {
        let name = checked_name(host_name)?;
        Ok(Self {
            id,
            status: RoomStatus::Waiting,
            players: vec![Player::new(name.clone(), rules.guesses_per_round, now)],
            host_name: name,
            created_at: now,
            last_activity: now,
            next_game_type: None,
            players_ready: IndexSet::new(),
            mode: ModeState::new(game_type),
            phase_started_at: None,
            rules,
            closed: false,
        })
    }

    /// Game type derived from the active mode state.
    pub fn game_type(&self) -> GameType {
        match self.mode {
            ModeState::Categories(_) => GameType::Categories,
            ModeState::Drawing(_) => GameType::Drawing,
        }
    }

    /// Index of the player named `name`, ignoring case and spacing.
    pub fn player_index(&self, name: &str) -> Option<usize> {
        let key = name_key(name);
        self.players.iter().position(|player| player.key() == key)
    }

    /// Player named `name`, ignoring case and spacing.
    pub fn player(&self, name: &str) -> Option<&Player> {
        self.player_index(name).map(|index| &self.players[index])
    }

    /// Player bound to `conn`.
    pub fn player_by_connection(&self, conn: ConnId) -> Option<&Player> {
        self.players
            .iter()
            .find(|player| player.connection_id == Some(conn))
    }

    /// Whether `name` currently holds host authority.
    pub fn is_host(&self, name: &str) -> bool {
        name_key(name) == name_key(&self.host_name)
    }

    /// Whether the room lost its last player and must be dropped.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Record inbound activity from `name`.
    pub fn touch(&mut self, name: &str, now: u64) {
        self.last_activity = now;
        if let Some(index) = self.player_index(name) {
            self.players[index].last_activity = now;
        }
    }

    /// Whether the room has been idle longer than its TTL.
    pub fn is_idle(&self, now: u64) -> bool {
        now.saturating_sub(self.last_activity) > self.rules.room_idle_ttl.as_millis() as u64
    }

    /// Reserve an unbound seat through the HTTP join flow.
    pub fn register(&mut self, raw_name: &str, now: u64) -> Result<String, JoinError> {
        let name = checked_name(raw_name)?;
        if self.player_index(&name).is_some() {
            return Err(JoinError::DuplicateName);
        }
        self.ensure_seat_available()?;

        self.players
            .push(Player::new(name.clone(), self.rules.guesses_per_round, now));
        self.last_activity = now;
        Ok(name)
    }

    fn ensure_seat_available(&self) -> Result<(), JoinError> {
        if self.status != RoomStatus::Waiting {
            return Err(JoinError::AlreadyStarted);
        }
        if self.players.len() >= self.rules.max_players {
            return Err(JoinError::RoomFull);
        }
        Ok(())
    }

    /// Bind `conn` to the seat named `raw_name`, creating it or treating the call as a rejoin.
    pub fn join(&mut self, conn: ConnId, raw_name: &str, now: u64) -> Result<Outbox, JoinError> {
        let mut out = Outbox::new();

        if let Some(index) = self.player_index(raw_name) {
            if self.players[index].connection_id == Some(conn) {
                debug!(room_id = %self.id, player = %raw_name, "duplicate join ignored");
                return Ok(out);
            }

            let stale_after = self.rules.stale_binding.as_millis() as u64;
            let player = &mut self.players[index];
            let stale = match player.connection_id {
                None => true,
                Some(_) => now.saturating_sub(player.last_activity) > stale_after,
            };
            if !stale {
                return Err(JoinError::DuplicateName);
            }

            let rejoining = player.has_connected;
            if let Some(previous) = player.connection_id.replace(conn) {
                out.release(previous);
            }
            player.pending_disconnect_deadline = None;
            player.has_connected = true;
            player.last_activity = now;
            let name = player.name.clone();

            out.cancel(TimerPurpose::DisconnectGrace(name_key(&name)));
            out.bind(conn, &name);
            self.last_activity = now;
            self.repair_host(&mut out);

            out.broadcast(self.room_update());
            if rejoining {
                info!(room_id = %self.id, player = %name, "player rejoined");
                out.broadcast_except(
                    &name,
                    ServerMessage::PlayerRejoined {
                        player_name: name.clone(),
                    },
                );
            } else {
                info!(room_id = %self.id, player = %name, "player connected");
            }
            out.to_connection(conn, self.scores_message());
            self.resync(conn, Some(&name), rejoining, now, &mut out);
            return Ok(out);
        }

        let name = checked_name(raw_name)?;
        self.ensure_seat_available()?;

        let mut player = Player::new(name.clone(), self.rules.guesses_per_round, now);
        player.connection_id = Some(conn);
        player.has_connected = true;
        self.players.push(player);
        self.last_activity = now;
        info!(room_id = %self.id, player = %name, "player joined");

        out.bind(conn, &name);
        self.repair_host(&mut out);
        out.broadcast(self.room_update());
        out.to_connection(conn, self.scores_message());
        Ok(out)
    }

    /// Explicit leave: immediate removal.
    pub fn leave(&mut self, name: &str, now: u64) -> Outbox {
        let mut out = Outbox::new();
        match self.player_index(name) {
            Some(index) => self.remove_player(index, Departure::Left, now, &mut out),
            None => debug!(room_id = %self.id, player = %name, "leave for unknown player ignored"),
        }
        out
    }

    /// Host removes `target` from the room.
    pub fn kick(&mut self, requester: &str, target: &str, now: u64) -> Outbox {
        let mut out = Outbox::new();
        if !self.is_host(requester) {
            debug!(room_id = %self.id, requester = %requester, "kick from non-host ignored");
            return out;
        }
        if name_key(requester) == name_key(target) {
            return out;
        }
        match self.player_index(target) {
            Some(index) => self.remove_player(index, Departure::Kicked, now, &mut out),
            None => debug!(room_id = %self.id, target = %target, "kick target not found"),
        }
        out
    }

    /// Transport closed for `conn`: keep the seat for the grace window.
    pub fn disconnect(&mut self, conn: ConnId, now: u64) -> Outbox {
        let mut out = Outbox::new();
        let grace = self.rules.disconnect_grace;
        let Some(player) = self
            .players
            .iter_mut()
            .find(|player| player.connection_id == Some(conn))
        else {
            return out;
        };

        player.connection_id = None;
        player.pending_disconnect_deadline = Some(now + grace.as_millis() as u64);
        let name = player.name.clone();
        info!(room_id = %self.id, player = %name, "player disconnected; grace window armed");

        out.broadcast_except(
            &name,
            ServerMessage::PlayerDisconnected {
                player_name: name.clone(),
            },
        );
        out.arm(TimerPurpose::DisconnectGrace(name_key(&name)), grace);

        if self.players_ready.shift_remove(&name) {
            out.broadcast(self.ready_update());
        }
        out
    }

    /// Dispatch a fired timer. Stale timers find their phase gone and do nothing.
    pub fn on_timer(&mut self, purpose: &TimerPurpose, now: u64) -> Outbox {
        let mut out = Outbox::new();
        match purpose {
            TimerPurpose::DisconnectGrace(key) => self.on_grace_expired(key, now, &mut out),
            _ if self.status != RoomStatus::Playing => {
                debug!(room_id = %self.id, ?purpose, "timer fired outside of play; ignored");
            }
            TimerPurpose::Countdown => self.on_countdown_tick(now, &mut out),
            TimerPurpose::TimeSync => self.on_time_sync(now, &mut out),
            TimerPurpose::PhaseEnd => match self.mode {
                ModeState::Categories(_) => self.end_category(&mut out),
                ModeState::Drawing(_) => self.end_round(&mut out),
            },
            TimerPurpose::Intermission => match self.mode {
                ModeState::Categories(_) => self.on_category_break_over(now, &mut out),
                ModeState::Drawing(_) => self.on_round_break_over(now, &mut out),
            },
        }
        out
    }

    /// Host starts the game for the current game type.
    pub fn start_game(&mut self, requester: &str, word_mode: Option<WordMode>, now: u64) -> Outbox {
        let mut out = Outbox::new();
        if !self.is_host(requester) || self.status != RoomStatus::Waiting {
            debug!(room_id = %self.id, requester = %requester, "start-game ignored");
            return out;
        }
        if self.players.len() < self.rules.min_players {
            debug!(room_id = %self.id, players = self.players.len(), "not enough players to start");
            return out;
        }

        self.status = RoomStatus::Playing;
        self.phase_started_at = None;
        self.players_ready.clear();
        self.next_game_type = None;
        info!(room_id = %self.id, game_type = ?self.game_type(), "game started");

        self.last_activity = now;
        match self.mode {
            ModeState::Categories(_) => self.start_category_race(&mut out),
            ModeState::Drawing(_) => self.start_drawing_game(word_mode, &mut out),
        }
        out
    }

    /// Host picks the drawing word mode while waiting.
    pub fn change_word_mode(&mut self, requester: &str, word_mode: WordMode) -> Outbox {
        let mut out = Outbox::new();
        if !self.is_host(requester) || self.status != RoomStatus::Waiting {
            return out;
        }
        let ModeState::Drawing(game) = &mut self.mode else {
            return out;
        };
        game.word_mode = word_mode;

        out.broadcast(ServerMessage::WordModeUpdated { word_mode });
        out.broadcast(self.room_update());
        out
    }

    /// Host switches the minigame; refused with an `error` once the game started.
    pub fn change_game_type(&mut self, requester: &str, conn: ConnId, game_type: GameType) -> Outbox {
        let mut out = Outbox::new();
        if !self.is_host(requester) {
            debug!(room_id = %self.id, requester = %requester, "change-game-type from non-host ignored");
            return out;
        }
        if self.status != RoomStatus::Waiting {
            out.to_connection(
                conn,
                ServerMessage::error(
                    crate::dto::ws::ErrorCode::InvalidState,
                    "the game type cannot change while a game is running",
                ),
            );
            return out;
        }

        let old_game_type = self.game_type();
        if old_game_type != game_type {
            self.mode = ModeState::new(game_type);
        }
        info!(room_id = %self.id, from = ?old_game_type, to = ?game_type, "game type changed");

        out.broadcast(self.room_update());
        out.broadcast(ServerMessage::GameTypeChanged {
            game_type,
            old_game_type,
        });
        out
    }

    /// Resync: membership snapshot for one connection.
    pub fn room_state_for(&self, conn: ConnId) -> Outbox {
        let mut out = Outbox::new();
        out.to_connection(conn, self.room_update());
        out
    }

    /// Resync: scores for one connection.
    pub fn scores_for(&self, conn: ConnId) -> Outbox {
        let mut out = Outbox::new();
        out.to_connection(conn, self.scores_message());
        out
    }

    /// Resolve a recipient to connection identifiers.
    pub fn recipients(&self, recipient: &Recipient) -> Vec<ConnId> {
        match recipient {
            Recipient::Room => self
                .players
                .iter()
                .filter_map(|player| player.connection_id)
                .collect(),
            Recipient::Others(name) => {
                let key = name_key(name);
                self.players
                    .iter()
                    .filter(|player| player.key() != key)
                    .filter_map(|player| player.connection_id)
                    .collect()
            }
            Recipient::Player(name) => self
                .player(name)
                .and_then(|player| player.connection_id)
                .into_iter()
                .collect(),
            Recipient::Connection(conn) => vec![*conn],
        }
    }

    /// Full membership snapshot.
    pub fn room_update(&self) -> ServerMessage {
        let word_mode = match &self.mode {
            ModeState::Drawing(game) => Some(game.word_mode),
            ModeState::Categories(_) => None,
        };
        ServerMessage::RoomUpdate {
            players: self
                .players
                .iter()
                .map(|player| PlayerSummary {
                    name: player.name.clone(),
                    score: player.score,
                    connected: player.connection_id.is_some(),
                    is_host: self.is_host(&player.name),
                })
                .collect(),
            status: self.status,
            game_type: self.game_type(),
            host_name: self.host_name.clone(),
            word_mode,
        }
    }

    /// Scores in join order.
    pub fn scores(&self) -> Vec<ScoreEntry> {
        self.players
            .iter()
            .map(|player| ScoreEntry {
                name: player.name.clone(),
                score: player.score,
            })
            .collect()
    }

    pub(crate) fn scores_message(&self) -> ServerMessage {
        ServerMessage::ScoresUpdate {
            scores: self.scores(),
        }
    }

    /// Scores ranked descending; ties keep join order.
    pub fn ranked_results(&self) -> Vec<RankedResult> {
        let mut ordered: Vec<&Player> = self.players.iter().collect();
        ordered.sort_by(|a, b| b.score.cmp(&a.score));
        ordered
            .into_iter()
            .enumerate()
            .map(|(index, player)| RankedResult {
                rank: index + 1,
                name: player.name.clone(),
                score: player.score,
            })
            .collect()
    }

    /// Seconds left in the active timed phase.
    pub fn time_left(&self, now: u64) -> Option<u64> {
        let started_at = self.phase_started_at?;
        let duration = self.active_phase_duration()?;
        Some(remaining_secs(started_at, duration, now))
    }

    fn active_phase_duration(&self) -> Option<Duration> {
        if self.status != RoomStatus::Playing {
            return None;
        }
        match &self.mode {
            ModeState::Categories(race) if race.is_active() => Some(self.rules.category_duration),
            ModeState::Drawing(game) if game.is_round_active() => Some(self.rules.round_duration),
            _ => None,
        }
    }

    /// Select the earliest-joined active player as host.
    ///
    /// Returns `false`, leaving the host untouched, when nobody qualifies.
    pub fn migrate_host(&mut self) -> bool {
        match self.players.iter().find(|player| player.is_active()) {
            Some(player) => {
                info!(room_id = %self.id, from = %self.host_name, to = %player.name, "host migrated");
                self.host_name = player.name.clone();
                true
            }
            None => {
                info!(room_id = %self.id, host = %self.host_name, "no connected player can take over as host");
                false
            }
        }
    }

    /// Re-run migration when the recorded host no longer has a seat.
    fn repair_host(&mut self, out: &mut Outbox) {
        if self.player(&self.host_name).is_none() && self.migrate_host() {
            out.broadcast(ServerMessage::HostChanged {
                new_host: self.host_name.clone(),
            });
        }
    }

    /// Remove the seat at `index` with all of the consequences of leaving.
    pub(crate) fn remove_player(
        &mut self,
        index: usize,
        departure: Departure,
        now: u64,
        out: &mut Outbox,
    ) {
        let name = self.players[index].name.clone();
        let key = name_key(&name);
        let was_host = self.is_host(&name);
        out.cancel(TimerPurpose::DisconnectGrace(key.clone()));

        if self.status == RoomStatus::Playing && self.is_current_drawer(index) {
            info!(room_id = %self.id, player = %name, "drawer left mid-round; ending round");
            self.end_round(out);
        }

        let player = self.players.remove(index);
        self.players_ready.shift_remove(&player.name);
        if let ModeState::Drawing(game) = &mut self.mode {
            game.forget_seat(index, &key);
        }

        if let Some(conn) = player.connection_id {
            if departure == Departure::Kicked {
                out.to_connection(conn, ServerMessage::Kicked);
            }
            out.release(conn);
        }
        info!(room_id = %self.id, player = %name, ?departure, remaining = self.players.len(), "player removed");

        if self.players.is_empty() {
            return;
        }

        if was_host && self.migrate_host() {
            out.broadcast(ServerMessage::HostChanged {
                new_host: self.host_name.clone(),
            });
        }

        let remaining_players = self.players.len();
        out.broadcast(match departure {
            Departure::TimedOut => ServerMessage::PlayerLeftPermanently {
                player_name: name,
                remaining_players,
            },
            Departure::Left | Departure::Kicked => ServerMessage::PlayerLeft {
                player_name: name,
                remaining_players,
            },
        });
        out.broadcast(self.room_update());

        match self.status {
            RoomStatus::Playing => self.after_seat_removed(now, out),
            RoomStatus::Finished => {
                out.broadcast(self.ready_update());
                self.maybe_restart(now, out);
            }
            RoomStatus::Waiting => {}
        }
    }

    fn on_grace_expired(&mut self, key: &str, now: u64, out: &mut Outbox) {
        let Some(index) = self.player_index(key) else {
            return;
        };
        let player = &self.players[index];
        if player.connection_id.is_some() || player.pending_disconnect_deadline.is_none() {
            debug!(room_id = %self.id, player = %player.name, "grace expired after rejoin; ignored");
            return;
        }
        info!(room_id = %self.id, player = %player.name, "grace window expired");
        self.remove_player(index, Departure::TimedOut, now, out);
    }

    fn on_countdown_tick(&mut self, now: u64, out: &mut Outbox) {
        let remaining = match &mut self.mode {
            ModeState::Categories(race) => race.countdown_tick(),
            ModeState::Drawing(game) => game.countdown_tick(),
        };
        match remaining {
            Some(0) => match self.mode {
                ModeState::Categories(_) => self.enter_category(now, out),
                ModeState::Drawing(_) => self.start_rounds(now, out),
            },
            Some(value) => {
                out.broadcast(ServerMessage::Countdown { value });
                out.arm(TimerPurpose::Countdown, Duration::from_secs(1));
            }
            None => {}
        }
    }

    fn on_time_sync(&mut self, now: u64, out: &mut Outbox) {
        let Some(time_left) = self.time_left(now) else {
            return;
        };
        if time_left == 0 {
            return;
        }
        out.broadcast(ServerMessage::TimeSync {
            time_left,
            server_time: now,
        });
        out.arm(TimerPurpose::TimeSync, self.rules.time_sync_interval);
    }

    /// Announce the first countdown value and arm its ticks.
    pub(crate) fn announce_countdown(&self, out: &mut Outbox) {
        out.broadcast(ServerMessage::Countdown {
            value: self.rules.countdown_ticks,
        });
        out.arm(TimerPurpose::Countdown, Duration::from_secs(1));
    }

    /// Arm the expiry and periodic sync of a timed phase starting at `now`.
    pub(crate) fn arm_timed_phase(&mut self, duration: Duration, now: u64, out: &mut Outbox) {
        self.phase_started_at = Some(now);
        out.arm(TimerPurpose::PhaseEnd, duration);
        out.arm(TimerPurpose::TimeSync, self.rules.time_sync_interval);
    }

    /// Cancel the expiry and periodic sync of the active timed phase.
    pub(crate) fn disarm_timed_phase(&self, out: &mut Outbox) {
        out.cancel(TimerPurpose::PhaseEnd);
        out.cancel(TimerPurpose::TimeSync);
    }

    /// Rank players, switch to `finished` and announce the results.
    pub(crate) fn finish_game(&mut self, out: &mut Outbox) {
        self.disarm_timed_phase(out);
        out.cancel(TimerPurpose::Intermission);
        self.status = RoomStatus::Finished;
        self.phase_started_at = None;
        self.players_ready.clear();
        self.next_game_type = None;

        let results = self.ranked_results();
        info!(room_id = %self.id, ?results, "game finished");
        out.broadcast(ServerMessage::GameFinished {
            results: results.clone(),
            room_id: self.id.clone(),
            host_name: self.host_name.clone(),
        });
        out.finish_with(results);
    }

    /// Replay the current phase to one connection.
    fn resync(
        &self,
        conn: ConnId,
        name: Option<&str>,
        rejoining: bool,
        now: u64,
        out: &mut Outbox,
    ) {
        match self.status {
            RoomStatus::Playing => match &self.mode {
                ModeState::Categories(_) => self.push_category_state(conn, now, out),
                ModeState::Drawing(_) => self.push_drawing_state(conn, name, rejoining, now, out),
            },
            RoomStatus::Finished => out.to_connection(conn, self.ready_update()),
            RoomStatus::Waiting => {}
        }
    }
}

/// Trim and validate a display name.
fn checked_name(raw: &str) -> Result<String, JoinError> {
    let name = tidy_name(raw);
    match player_name_problem(&name) {
        Some(problem) => Err(JoinError::InvalidName(problem)),
        None => Ok(name),
    }
}
