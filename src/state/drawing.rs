//! Draw & guess: one timed round per player, the drawer's word hidden from the others.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, info};

use crate::{
    dto::ws::ServerMessage,
    state::{
        outbox::{ConnId, Outbox, TimerPurpose},
        room::{ModeState, Room, RoomStatus, WordMode},
        text::{name_key, normalize},
        timing::elapsed_secs,
        words::random_drawing_words,
    },
};

/// Phase of a drawing game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrawPhase {
    /// No game running.
    #[default]
    Idle,
    /// Players are submitting the words they will draw.
    CollectingWords,
    /// 3-2-1 countdown before the first round.
    Countdown {
        /// Ticks still to announce.
        remaining: u8,
    },
    /// A round accepts strokes and guesses.
    Round,
    /// Pause after a round.
    Break {
        /// Drawer slot of the next round.
        next_round: usize,
    },
}

/// Draw & guess state.
#[derive(Debug, Clone, Default)]
pub struct DrawGuess {
    /// Current phase.
    pub phase: DrawPhase,
    /// Where the words come from.
    pub word_mode: WordMode,
    /// Words submitted during collection, keyed by name key.
    pub submitted_words: HashMap<String, String>,
    /// Name keys of players whose word is locked in.
    pub ready_status: HashSet<String>,
    /// Secret word per drawer slot, fixed once the countdown starts.
    pub drawing_words: Vec<String>,
    /// Drawer slot of the current round; the round number is this plus one.
    pub current_round: usize,
    /// Name keys of players who solved the current round.
    pub guessed_players: HashSet<String>,
    /// Strokes of the current round, replayed on resync.
    pub canvas_strokes: Vec<Value>,
}

impl DrawGuess {
    /// Whether a round currently accepts guesses.
    pub fn is_round_active(&self) -> bool {
        self.phase == DrawPhase::Round
    }

    pub(crate) fn countdown_tick(&mut self) -> Option<u8> {
        let DrawPhase::Countdown { remaining } = &mut self.phase else {
            return None;
        };
        *remaining = remaining.saturating_sub(1);
        Some(*remaining)
    }

    /// Drop everything tied to the seat at `index` and keep slot indices aligned.
    pub(crate) fn forget_seat(&mut self, index: usize, key: &str) {
        self.ready_status.remove(key);
        self.submitted_words.remove(key);
        if index < self.drawing_words.len() {
            self.drawing_words.remove(index);
        }
        if index < self.current_round {
            self.current_round -= 1;
        }
        if let DrawPhase::Break { next_round } = &mut self.phase {
            if index < *next_round {
                *next_round -= 1;
            }
        }
    }
}

/// Points for a correct guess after `elapsed` whole seconds.
pub fn guesser_points(elapsed: u64) -> u32 {
    100u64.saturating_sub(elapsed).max(10) as u32
}

/// Points for the drawer once the round is over.
pub fn drawer_points(guessed: usize, non_drawers: usize) -> u32 {
    let bonus = if guessed > 0 && guessed == non_drawers {
        50
    } else {
        0
    };
    guessed as u32 * 25 + bonus
}

impl Room {
    fn drawing(&self) -> Option<&DrawGuess> {
        match &self.mode {
            ModeState::Drawing(game) => Some(game),
            ModeState::Categories(_) => None,
        }
    }

    fn drawing_mut(&mut self) -> Option<&mut DrawGuess> {
        match &mut self.mode {
            ModeState::Drawing(game) => Some(game),
            ModeState::Categories(_) => None,
        }
    }

    /// Whether the seat at `index` is drawing the active round.
    pub(crate) fn is_current_drawer(&self, index: usize) -> bool {
        self.drawing()
            .is_some_and(|game| game.is_round_active() && game.current_round == index)
    }

    fn is_drawer(&self, name: &str) -> bool {
        self.player_index(name)
            .is_some_and(|index| self.is_current_drawer(index))
    }

    pub(crate) fn start_drawing_game(&mut self, word_mode: Option<WordMode>, out: &mut Outbox) {
        let total_players = self.players.len();
        let Some(game) = self.drawing_mut() else {
            return;
        };
        let word_mode = word_mode.unwrap_or(game.word_mode);
        *game = DrawGuess {
            word_mode,
            ..DrawGuess::default()
        };

        match word_mode {
            WordMode::Random => self.begin_drawing_countdown(out),
            WordMode::Player => {
                game.phase = DrawPhase::CollectingWords;
                out.broadcast(ServerMessage::WaitingForWords { total_players });
                out.broadcast(self.words_update());
            }
        }
    }

    /// Fix the word of every drawer slot and start the countdown.
    fn begin_drawing_countdown(&mut self, out: &mut Outbox) {
        let ticks = self.rules.countdown_ticks;
        let keys: Vec<String> = self.players.iter().map(|player| player.key()).collect();
        let Some(game) = self.drawing_mut() else {
            return;
        };

        game.drawing_words = match game.word_mode {
            WordMode::Random => random_drawing_words(&mut rand::rng(), keys.len()),
            WordMode::Player => keys
                .iter()
                .map(|key| game.submitted_words.get(key).cloned().unwrap_or_default())
                .collect(),
        };
        game.phase = DrawPhase::Countdown { remaining: ticks };
        info!(room_id = %self.id, "drawing words locked; countdown started");
        self.announce_countdown(out);
    }

    /// `words-update` for the word collection phase.
    fn words_update(&self) -> ServerMessage {
        let ready = self.drawing().map(|game| &game.ready_status);
        let ready_players: Vec<String> = self
            .players
            .iter()
            .filter(|player| ready.is_some_and(|ready| ready.contains(&player.key())))
            .map(|player| player.name.clone())
            .collect();
        let total_players = self.players.len();
        ServerMessage::WordsUpdate {
            ready_count: ready_players.len(),
            total_players,
            all_ready: total_players > 0 && ready_players.len() == total_players,
            ready_players,
        }
    }

    fn collecting_words(&self) -> bool {
        self.status == RoomStatus::Playing
            && self
                .drawing()
                .is_some_and(|game| game.phase == DrawPhase::CollectingWords)
    }

    fn all_words_ready(&self) -> bool {
        self.drawing().is_some_and(|game| {
            !self.players.is_empty()
                && self
                    .players
                    .iter()
                    .all(|player| game.ready_status.contains(&player.key()))
        })
    }

    /// Lock in the word `name` will draw.
    pub fn submit_word(&mut self, name: &str, word: &str) -> Outbox {
        let mut out = Outbox::new();
        let word = word.trim();
        if !self.collecting_words() || word.is_empty() || self.player_index(name).is_none() {
            return out;
        }
        let key = name_key(name);
        if let Some(game) = self.drawing_mut() {
            game.submitted_words.insert(key.clone(), word.to_string());
            game.ready_status.insert(key);
        }
        debug!(room_id = %self.id, player = %name, "drawing word submitted");

        out.broadcast(self.words_update());
        if self.all_words_ready() {
            self.begin_drawing_countdown(&mut out);
        }
        out
    }

    /// Unlock the word of `name` so it can be edited.
    pub fn start_editing_word(&mut self, name: &str) -> Outbox {
        let mut out = Outbox::new();
        if !self.collecting_words() {
            return out;
        }
        let Some(player_name) = self.player(name).map(|player| player.name.clone()) else {
            return out;
        };
        let unlocked = self
            .drawing_mut()
            .is_some_and(|game| game.ready_status.remove(&name_key(name)));
        if !unlocked {
            return out;
        }

        out.broadcast(ServerMessage::PlayerEditingWord { player_name });
        out.broadcast(self.words_update());
        out
    }

    pub(crate) fn start_rounds(&mut self, now: u64, out: &mut Outbox) {
        if let Some(game) = self.drawing_mut() {
            game.current_round = 0;
        }
        self.start_round(now, out);
    }

    fn start_round(&mut self, now: u64, out: &mut Outbox) {
        let round_duration = self.rules.round_duration;
        let guesses = self.rules.guesses_per_round;
        let total_rounds = self.players.len();
        let Some(game) = self.drawing_mut() else {
            return;
        };
        let slot = game.current_round;
        if slot >= total_rounds || slot >= game.drawing_words.len() {
            game.phase = DrawPhase::Idle;
            self.finish_game(out);
            return;
        }

        game.phase = DrawPhase::Round;
        game.guessed_players.clear();
        game.canvas_strokes.clear();
        let word = game.drawing_words[slot].clone();
        for player in &mut self.players {
            player.remaining_guesses = guesses;
        }
        self.arm_timed_phase(round_duration, now, out);

        let drawer_name = self.players[slot].name.clone();
        info!(room_id = %self.id, round = slot + 1, drawer = %drawer_name, "drawing round started");
        let time_left = round_duration.as_secs();
        out.to_player(
            &drawer_name,
            ServerMessage::YourTurnToDraw {
                word,
                round: slot + 1,
                total_rounds,
                time_left,
                server_time: now,
                is_rejoining: false,
            },
        );
        out.broadcast_except(
            &drawer_name,
            ServerMessage::SomeoneDrawing {
                drawer_name: drawer_name.clone(),
                round: slot + 1,
                total_rounds,
                time_left,
                server_time: now,
                is_rejoining: false,
            },
        );
    }

    /// Check a guess against the secret word.
    pub fn submit_guess(&mut self, name: &str, guess: &str, now: u64) -> Outbox {
        let mut out = Outbox::new();
        if self.status != RoomStatus::Playing {
            return out;
        }
        let Some(index) = self.player_index(name) else {
            return out;
        };
        let player_name = self.players[index].name.clone();
        let Some(game) = self.drawing() else {
            return out;
        };

        match game.phase {
            DrawPhase::Round => {}
            DrawPhase::Break { .. } => {
                out.to_player(&player_name, ServerMessage::RoundAlreadyEnded);
                return out;
            }
            _ => return out,
        }
        let key = name_key(&player_name);
        if index == game.current_round || game.guessed_players.contains(&key) {
            return out;
        }
        if self.players[index].remaining_guesses == 0 {
            out.to_player(&player_name, ServerMessage::NoGuessesLeft);
            return out;
        }
        if guess.trim().is_empty() {
            return out;
        }

        let solved = game
            .drawing_words
            .get(game.current_round)
            .is_some_and(|word| normalize(word) == normalize(guess));
        let started_at = self.phase_started_at.unwrap_or(now);

        if solved {
            if let Some(game) = self.drawing_mut() {
                game.guessed_players.insert(key);
            }
            let time_elapsed = elapsed_secs(started_at, now);
            let points_earned = guesser_points(time_elapsed);
            self.players[index].score += points_earned;
            info!(room_id = %self.id, player = %player_name, points_earned, "correct guess");

            out.broadcast(ServerMessage::CorrectGuess {
                player_name,
                points_earned,
                time_elapsed,
                scores: self.scores(),
            });
        } else {
            let player = &mut self.players[index];
            player.remaining_guesses -= 1;
            let remaining_guesses = player.remaining_guesses;

            out.broadcast(ServerMessage::WrongGuess {
                player_name: player_name.clone(),
                guess: guess.to_string(),
                remaining_guesses,
            });
            out.to_player(&player_name, ServerMessage::GuessesUpdate { remaining_guesses });
        }

        if self.round_settled() {
            info!(room_id = %self.id, "every guesser is done; ending round early");
            self.end_round(&mut out);
        }
        out
    }

    /// Whether every non-drawer has either guessed or run out of attempts.
    fn round_settled(&self) -> bool {
        let Some(game) = self.drawing().filter(|game| game.is_round_active()) else {
            return false;
        };
        self.players
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != game.current_round)
            .all(|(_, player)| {
                game.guessed_players.contains(&player.key()) || player.remaining_guesses == 0
            })
    }

    /// Close the active round, award the drawer and schedule the next one.
    pub(crate) fn end_round(&mut self, out: &mut Outbox) {
        let round_break = self.rules.round_break;
        let Some(game) = self.drawing().filter(|game| game.is_round_active()) else {
            return;
        };
        let slot = game.current_round;
        let Some(drawer) = self.players.get(slot) else {
            return;
        };
        let word = game.drawing_words.get(slot).cloned().unwrap_or_default();
        // Guessers who left since keep counting for the drawer.
        let guessed_count = game.guessed_players.len()
            - usize::from(game.guessed_players.contains(&drawer.key()));
        let non_drawers = self.players.len() - 1;
        let points = drawer_points(guessed_count, non_drawers);
        let drawer_name = drawer.name.clone();

        self.players[slot].score += points;
        if let Some(game) = self.drawing_mut() {
            game.phase = DrawPhase::Break {
                next_round: slot + 1,
            };
        }
        self.disarm_timed_phase(out);
        self.phase_started_at = None;
        info!(
            room_id = %self.id,
            round = slot + 1,
            drawer = %drawer_name,
            drawer_points = points,
            guessed_count,
            "drawing round ended"
        );

        out.broadcast(ServerMessage::RoundEnded {
            word,
            drawer_name,
            drawer_points: points,
            guessed_count,
            total_players: non_drawers,
            all_guessed: guessed_count > 0 && guessed_count == non_drawers,
            scores: self.scores(),
        });
        out.arm(TimerPurpose::Intermission, round_break);
    }

    pub(crate) fn on_round_break_over(&mut self, now: u64, out: &mut Outbox) {
        let Some(game) = self.drawing_mut() else {
            return;
        };
        let DrawPhase::Break { next_round } = game.phase else {
            return;
        };
        game.current_round = next_round;
        self.start_round(now, out);
    }

    /// Keep a drawing game consistent after a seat disappeared mid-game.
    pub(crate) fn after_seat_removed(&mut self, _now: u64, out: &mut Outbox) {
        let Some(phase) = self.drawing().map(|game| game.phase) else {
            return;
        };
        match phase {
            DrawPhase::CollectingWords => {
                out.broadcast(self.words_update());
                if self.all_words_ready() {
                    self.begin_drawing_countdown(out);
                }
            }
            DrawPhase::Round if self.round_settled() => self.end_round(out),
            _ => {}
        }
    }

    /// Record a stroke from the drawer and relay it to everyone else.
    pub fn draw(&mut self, name: &str, draw_data: Value) -> Outbox {
        let mut out = Outbox::new();
        if self.status != RoomStatus::Playing || !self.is_drawer(name) {
            return out;
        }
        let Some(game) = self.drawing_mut() else {
            return out;
        };
        game.canvas_strokes.push(draw_data.clone());
        out.broadcast_except(name, ServerMessage::Drawing { draw_data });
        out
    }

    /// Drawer wipes the canvas.
    pub fn clear_canvas(&mut self, name: &str) -> Outbox {
        let mut out = Outbox::new();
        if self.status != RoomStatus::Playing || !self.is_drawer(name) {
            return out;
        }
        if let Some(game) = self.drawing_mut() {
            game.canvas_strokes.clear();
        }
        out.broadcast_except(name, ServerMessage::CanvasCleared);
        out
    }

    /// Resync: replay the current drawing phase to one connection.
    pub(crate) fn push_drawing_state(
        &self,
        conn: ConnId,
        name: Option<&str>,
        is_rejoining: bool,
        now: u64,
        out: &mut Outbox,
    ) {
        let Some(game) = self.drawing() else {
            return;
        };
        match game.phase {
            DrawPhase::CollectingWords => out.to_connection(conn, self.words_update()),
            DrawPhase::Round => {
                let slot = game.current_round;
                let Some(drawer) = self.players.get(slot) else {
                    return;
                };
                let round = slot + 1;
                let total_rounds = self.players.len();
                let time_left = self.time_left(now).unwrap_or_default();
                let caller = name.and_then(|name| self.player(name));

                if caller.is_some_and(|caller| caller.key() == drawer.key()) {
                    out.to_connection(
                        conn,
                        ServerMessage::YourTurnToDraw {
                            word: game.drawing_words.get(slot).cloned().unwrap_or_default(),
                            round,
                            total_rounds,
                            time_left,
                            server_time: now,
                            is_rejoining,
                        },
                    );
                } else {
                    out.to_connection(
                        conn,
                        ServerMessage::SomeoneDrawing {
                            drawer_name: drawer.name.clone(),
                            round,
                            total_rounds,
                            time_left,
                            server_time: now,
                            is_rejoining,
                        },
                    );
                    if let Some(caller) = caller {
                        out.to_connection(
                            conn,
                            ServerMessage::GuessesUpdate {
                                remaining_guesses: caller.remaining_guesses,
                            },
                        );
                    }
                }
                if !game.canvas_strokes.is_empty() {
                    out.to_connection(
                        conn,
                        ServerMessage::RestoreCanvas {
                            drawings: game.canvas_strokes.clone(),
                        },
                    );
                }
            }
            _ => {}
        }
    }

    /// Explicit `request-drawing-state`.
    pub fn drawing_state_for(&self, conn: ConnId, now: u64) -> Outbox {
        let mut out = Outbox::new();
        if self.status != RoomStatus::Playing {
            return out;
        }
        let name = self.player_by_connection(conn).map(|player| player.name.as_str());
        self.push_drawing_state(conn, name, false, now, &mut out);
        out.to_connection(conn, self.scores_message());
        out
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::{
        outbox::Recipient,
        room::{
            GameType,
            tests::{T0, armed, room_with, sent},
        },
    };

    /// Random-word game already in its first round, with fixed secret words.
    fn first_round(names: &[&str], words: &[&str]) -> (Room, Vec<ConnId>) {
        let (mut room, conns) = room_with(names, GameType::Drawing);
        room.start_game(names[0], Some(WordMode::Random), T0);
        if let Some(game) = room.drawing_mut() {
            game.drawing_words = words.iter().map(|word| word.to_string()).collect();
        }
        for tick in 1..=3u64 {
            room.on_timer(&TimerPurpose::Countdown, T0 + tick * 1_000);
        }
        (room, conns)
    }

    fn game(room: &Room) -> &DrawGuess {
        room.drawing().unwrap()
    }

    #[test]
    fn scoring_formulas() {
        assert_eq!(guesser_points(0), 100);
        assert_eq!(guesser_points(10), 90);
        assert_eq!(guesser_points(95), 10);
        assert_eq!(drawer_points(0, 2), 0);
        assert_eq!(drawer_points(1, 2), 25);
        assert_eq!(drawer_points(2, 2), 100);
    }

    #[test]
    fn first_round_sends_word_only_to_drawer() {
        let (mut room, _) = room_with(&["P1", "P2", "P3"], GameType::Drawing);
        room.start_game("P1", Some(WordMode::Random), T0);
        assert_eq!(game(&room).drawing_words.len(), 3);
        for tick in 1..=2u64 {
            room.on_timer(&TimerPurpose::Countdown, T0 + tick * 1_000);
        }
        let out = room.on_timer(&TimerPurpose::Countdown, T0 + 3_000);

        assert!(armed(&out, &TimerPurpose::PhaseEnd));
        let to_drawer = out.messages().iter().find(|(recipient, _)| {
            *recipient == Recipient::Player("P1".into())
        });
        assert!(matches!(
            to_drawer,
            Some((_, ServerMessage::YourTurnToDraw { round: 1, total_rounds: 3, time_left: 60, .. }))
        ));
        assert!(out.messages().iter().any(|(recipient, message)| {
            *recipient == Recipient::Others("P1".into())
                && matches!(message, ServerMessage::SomeoneDrawing { .. })
        }));
    }

    #[test]
    fn partial_guessing_scores_with_time_decay_and_no_bonus() {
        let (mut room, _) = first_round(&["P1", "P2", "P3"], &["شجرة", "قمر", "بيت"]);

        let out = room.submit_guess("P2", "شجره", T0 + 13_000);
        assert!(sent(&out).iter().any(|message| matches!(
            message,
            ServerMessage::CorrectGuess { points_earned: 90, time_elapsed: 10, .. }
        )));
        assert_eq!(room.players[1].score, 90);

        let out = room.on_timer(&TimerPurpose::PhaseEnd, T0 + 63_000);
        assert_eq!(room.players[0].score, 25);
        assert!(sent(&out).iter().any(|message| matches!(
            message,
            ServerMessage::RoundEnded { drawer_points: 25, guessed_count: 1, all_guessed: false, .. }
        )));
        assert!(armed(&out, &TimerPurpose::Intermission));
    }

    #[test]
    fn everyone_guessing_ends_round_early_with_bonus() {
        let (mut room, _) = first_round(&["P1", "P2", "P3"], &["شجرة", "قمر", "بيت"]);
        room.submit_guess("P2", "شجرة", T0 + 5_000);
        let out = room.submit_guess("P3", "شجرة", T0 + 6_000);

        assert_eq!(room.players[0].score, 100);
        assert!(matches!(game(&room).phase, DrawPhase::Break { next_round: 1 }));
        assert!(
            out.timers()
                .contains(&crate::state::outbox::TimerCommand::Cancel(TimerPurpose::PhaseEnd))
        );

        let out = room.submit_guess("P2", "قمر", T0 + 7_000);
        assert_eq!(
            out.messages(),
            &[(Recipient::Player("P2".into()), ServerMessage::RoundAlreadyEnded)]
        );
    }

    #[test]
    fn exhausting_guesses_settles_the_round() {
        let (mut room, _) = first_round(&["P1", "P2"], &["شجرة", "قمر"]);
        for attempt in 0..4 {
            let out = room.submit_guess("P2", "سيارة", T0 + 4_000 + attempt);
            assert!(out.messages().contains(&(
                Recipient::Player("P2".into()),
                ServerMessage::GuessesUpdate {
                    remaining_guesses: 4 - attempt as u8
                }
            )));
        }
        assert!(game(&room).is_round_active());

        room.submit_guess("P2", "سيارة", T0 + 9_000);
        assert!(matches!(game(&room).phase, DrawPhase::Break { .. }));
        assert_eq!(room.players[0].score, 0);
    }

    #[test]
    fn drawer_and_solved_players_cannot_guess() {
        let (mut room, _) = first_round(&["P1", "P2", "P3"], &["شجرة", "قمر", "بيت"]);
        assert!(room.submit_guess("P1", "شجرة", T0 + 4_000).is_empty());

        room.submit_guess("P2", "شجرة", T0 + 4_000);
        assert!(room.submit_guess("P2", "شجرة", T0 + 5_000).is_empty());
        assert_eq!(room.players[1].score, 99);
    }

    #[test]
    fn rounds_advance_then_game_finishes() {
        let (mut room, _) = first_round(&["P1", "P2"], &["شجرة", "قمر"]);
        room.on_timer(&TimerPurpose::PhaseEnd, T0 + 63_000);
        let out = room.on_timer(&TimerPurpose::Intermission, T0 + 68_000);

        assert_eq!(game(&room).current_round, 1);
        assert!(out.messages().iter().any(|(recipient, message)| {
            *recipient == Recipient::Player("P2".into())
                && matches!(message, ServerMessage::YourTurnToDraw { round: 2, .. })
        }));

        room.on_timer(&TimerPurpose::PhaseEnd, T0 + 128_000);
        let out = room.on_timer(&TimerPurpose::Intermission, T0 + 133_000);
        assert_eq!(room.status, RoomStatus::Finished);
        assert!(out.results().is_some());
    }

    #[test]
    fn drawer_leaving_mid_round_ends_it_and_next_slot_draws() {
        let (mut room, _) = first_round(&["P1", "P2", "P3"], &["شجرة", "قمر", "بيت"]);
        room.submit_guess("P2", "شجرة", T0 + 13_000);

        let out = room.leave("P1", T0 + 14_000);
        assert!(sent(&out).iter().any(|message| matches!(
            message,
            ServerMessage::RoundEnded { drawer_points: 25, .. }
        )));
        assert!(matches!(game(&room).phase, DrawPhase::Break { next_round: 0 }));
        assert_eq!(game(&room).drawing_words, vec!["قمر", "بيت"]);

        let out = room.on_timer(&TimerPurpose::Intermission, T0 + 19_000);
        assert!(out.messages().iter().any(|(recipient, message)| {
            *recipient == Recipient::Player("P2".into())
                && matches!(message, ServerMessage::YourTurnToDraw { word, .. } if word == "قمر")
        }));
    }

    #[test]
    fn player_words_are_collected_before_countdown() {
        let (mut room, _) = room_with(&["P1", "P2"], GameType::Drawing);
        let out = room.start_game("P1", None, T0);
        assert!(sent(&out).contains(&&ServerMessage::WaitingForWords { total_players: 2 }));

        room.submit_word("P1", " شمس ");
        room.start_editing_word("P1");
        assert!(game(&room).ready_status.is_empty());

        room.submit_word("P2", "قمر");
        let out = room.submit_word("P1", "نجمة");
        assert!(sent(&out).contains(&&ServerMessage::Countdown { value: 3 }));
        assert_eq!(game(&room).drawing_words, vec!["نجمة", "قمر"]);
    }

    #[test]
    fn strokes_are_relayed_and_replayed_on_resync() {
        let (mut room, conns) = first_round(&["P1", "P2"], &["شجرة", "قمر"]);
        assert!(room.draw("P2", json!({"x": 1})).is_empty());

        let out = room.draw("P1", json!({"x": 1}));
        assert_eq!(
            out.messages(),
            &[(
                Recipient::Others("P1".into()),
                ServerMessage::Drawing {
                    draw_data: json!({"x": 1})
                }
            )]
        );

        let out = room.drawing_state_for(conns[1], T0 + 33_000);
        assert!(sent(&out).iter().any(|message| matches!(
            message,
            ServerMessage::SomeoneDrawing { time_left: 30, .. }
        )));
        assert!(sent(&out).contains(&&ServerMessage::RestoreCanvas {
            drawings: vec![json!({"x": 1})]
        }));

        room.clear_canvas("P1");
        assert!(game(&room).canvas_strokes.is_empty());
    }

    #[test]
    fn rejoining_drawer_gets_word_back() {
        let (mut room, conns) = first_round(&["P1", "P2"], &["شجرة", "قمر"]);
        room.disconnect(conns[0], T0 + 10_000);

        let fresh = uuid::Uuid::new_v4();
        let out = room.join(fresh, "P1", T0 + 12_000).unwrap();
        assert!(out.messages().iter().any(|(recipient, message)| {
            *recipient == Recipient::Connection(fresh)
                && matches!(
                    message,
                    ServerMessage::YourTurnToDraw { is_rejoining: true, time_left: 51, .. }
                )
        }));
    }

    #[test]
    fn guessers_who_left_still_count_for_the_drawer() {
        let (mut room, _) = first_round(&["P1", "P2", "P3"], &["شجرة", "قمر", "بيت"]);
        room.submit_guess("P2", "شجرة", T0 + 13_000);
        room.leave("P2", T0 + 14_000);
        assert!(game(&room).is_round_active());

        let out = room.submit_guess("P3", "شجرة", T0 + 15_000);
        assert_eq!(room.players[0].score, 50);
        assert!(sent(&out).iter().any(|message| matches!(
            message,
            ServerMessage::RoundEnded {
                drawer_points: 50,
                guessed_count: 2,
                total_players: 1,
                all_guessed: false,
                ..
            }
        )));
    }

    #[test]
    fn round_without_guessers_is_not_reported_as_all_guessed() {
        let (mut room, _) = first_round(&["P1", "P2"], &["شجرة", "قمر"]);

        let out = room.leave("P2", T0 + 10_000);
        assert_eq!(room.players[0].score, 0);
        assert!(sent(&out).iter().any(|message| matches!(
            message,
            ServerMessage::RoundEnded {
                drawer_points: 0,
                guessed_count: 0,
                total_players: 0,
                all_guessed: false,
                ..
            }
        )));
    }

    #[test]
    fn earlier_seat_leaving_mid_round_keeps_drawer_and_word_aligned() {
        let (mut room, _) = first_round(&["P1", "P2", "P3"], &["شجرة", "قمر", "بيت"]);
        room.on_timer(&TimerPurpose::PhaseEnd, T0 + 63_000);
        room.on_timer(&TimerPurpose::Intermission, T0 + 68_000);
        assert_eq!(game(&room).current_round, 1);

        room.leave("P1", T0 + 70_000);
        assert!(game(&room).is_round_active());
        assert_eq!(game(&room).current_round, 0);
        assert_eq!(room.players[0].name, "P2");
        assert_eq!(game(&room).drawing_words, vec!["قمر", "بيت"]);

        let out = room.submit_guess("P3", "قمر", T0 + 71_000);
        assert_eq!(room.players[0].score, 75);
        assert!(matches!(game(&room).phase, DrawPhase::Break { next_round: 1 }));
        assert!(sent(&out).iter().any(|message| matches!(
            message,
            ServerMessage::RoundEnded { drawer_name, .. } if drawer_name == "P2"
        )));

        let out = room.on_timer(&TimerPurpose::Intermission, T0 + 76_000);
        assert!(out.messages().iter().any(|(recipient, message)| {
            *recipient == Recipient::Player("P3".into())
                && matches!(
                    message,
                    ServerMessage::YourTurnToDraw { word, round: 2, total_rounds: 2, .. }
                        if word == "بيت"
                )
        }));
    }

    #[test]
    fn seats_leaving_during_break_shift_the_next_drawer() {
        let (mut room, _) = first_round(&["P1", "P2", "P3"], &["شجرة", "قمر", "بيت"]);
        room.on_timer(&TimerPurpose::PhaseEnd, T0 + 63_000);
        assert!(matches!(game(&room).phase, DrawPhase::Break { next_round: 1 }));

        room.leave("P1", T0 + 64_000);
        assert!(matches!(game(&room).phase, DrawPhase::Break { next_round: 0 }));
        let out = room.on_timer(&TimerPurpose::Intermission, T0 + 68_000);
        assert!(out.messages().iter().any(|(recipient, message)| {
            *recipient == Recipient::Player("P2".into())
                && matches!(message, ServerMessage::YourTurnToDraw { word, .. } if word == "قمر")
        }));
    }

    #[test]
    fn next_drawer_leaving_during_break_finishes_when_no_rounds_remain() {
        let (mut room, _) = first_round(&["P1", "P2", "P3"], &["شجرة", "قمر", "بيت"]);
        room.on_timer(&TimerPurpose::PhaseEnd, T0 + 63_000);
        room.on_timer(&TimerPurpose::Intermission, T0 + 68_000);
        room.on_timer(&TimerPurpose::PhaseEnd, T0 + 128_000);
        assert!(matches!(game(&room).phase, DrawPhase::Break { next_round: 2 }));

        room.leave("P3", T0 + 129_000);
        assert_eq!(game(&room).drawing_words, vec!["شجرة", "قمر"]);
        assert!(matches!(game(&room).phase, DrawPhase::Break { next_round: 2 }));

        let out = room.on_timer(&TimerPurpose::Intermission, T0 + 133_000);
        assert_eq!(room.status, RoomStatus::Finished);
        assert_eq!(out.results().map(|results| results.len()), Some(2));
    }
}
