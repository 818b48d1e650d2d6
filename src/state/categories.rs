//! Category race: three timed categories played back to back.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::{
    dto::ws::{MathQuestionView, ServerMessage},
    state::{
        outbox::{ConnId, Outbox, TimerPurpose},
        room::{ModeState, Room, RoomStatus},
        text::{normalize, parse_number},
        timing::remaining_secs,
        words::{CATEGORIES, CategoryId, MathQuestion},
    },
};

/// Phase of the category race.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RacePhase {
    /// No race running.
    #[default]
    Idle,
    /// 3-2-1 countdown before the first category.
    Countdown {
        /// Ticks still to announce.
        remaining: u8,
    },
    /// A category accepts answers.
    Active,
    /// Pause before the next category.
    Break,
}

/// Category race state.
#[derive(Debug, Clone, Default)]
pub struct CategoryRace {
    /// Current phase.
    pub phase: RacePhase,
    /// Index into [`CATEGORIES`].
    pub current_index: usize,
    /// Normalized answers already scored in the active category.
    pub used_answers: HashSet<String>,
    /// Question of the active arithmetic category.
    pub math_question: Option<MathQuestion>,
}

impl CategoryRace {
    /// Whether a category currently accepts answers.
    pub fn is_active(&self) -> bool {
        self.phase == RacePhase::Active
    }

    /// Advance the countdown, returning the value left to announce.
    pub(crate) fn countdown_tick(&mut self) -> Option<u8> {
        let RacePhase::Countdown { remaining } = &mut self.phase else {
            return None;
        };
        *remaining = remaining.saturating_sub(1);
        Some(*remaining)
    }

    fn category(&self) -> Option<CategoryId> {
        CATEGORIES.get(self.current_index).map(|info| info.id)
    }
}

/// Outcome of one submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Correct,
    Duplicate,
    Incorrect,
}

impl Room {
    fn race(&self) -> Option<&CategoryRace> {
        match &self.mode {
            ModeState::Categories(race) => Some(race),
            ModeState::Drawing(_) => None,
        }
    }

    fn race_mut(&mut self) -> Option<&mut CategoryRace> {
        match &mut self.mode {
            ModeState::Categories(race) => Some(race),
            ModeState::Drawing(_) => None,
        }
    }

    pub(crate) fn start_category_race(&mut self, out: &mut Outbox) {
        let ticks = self.rules.countdown_ticks;
        if let Some(race) = self.race_mut() {
            *race = CategoryRace {
                phase: RacePhase::Countdown { remaining: ticks },
                ..CategoryRace::default()
            };
        }
        self.announce_countdown(out);
    }

    /// Open the category at the current index.
    pub(crate) fn enter_category(&mut self, now: u64, out: &mut Outbox) {
        let duration = self.rules.category_duration;
        let Some(race) = self.race_mut() else {
            return;
        };
        let Some(category) = race.category() else {
            return;
        };

        race.phase = RacePhase::Active;
        race.used_answers.clear();
        race.math_question =
            (category == CategoryId::Math).then(|| MathQuestion::generate(&mut rand::rng()));
        let number = race.current_index + 1;

        self.arm_timed_phase(duration, now, out);
        info!(room_id = %self.id, category = ?category, number, "category started");
        if let Some(message) = self.category_started(now) {
            out.broadcast(message);
        }
    }

    /// `category-started` payload for the active category.
    fn category_started(&self, now: u64) -> Option<ServerMessage> {
        let race = self.race().filter(|race| race.is_active())?;
        let category = *CATEGORIES.get(race.current_index)?;
        let start_time = self.phase_started_at?;
        Some(ServerMessage::CategoryStarted {
            category,
            category_number: race.current_index + 1,
            total_categories: CATEGORIES.len(),
            math_question: race.math_question.as_ref().map(math_view),
            start_time,
            time_left: remaining_secs(start_time, self.rules.category_duration, now),
            server_time: now,
        })
    }

    /// Score an answer against the active category.
    pub fn submit_answer(&mut self, name: &str, answer: &str) -> Outbox {
        let mut out = Outbox::new();
        if self.status != RoomStatus::Playing {
            return out;
        }
        let Some(index) = self.player_index(name) else {
            return out;
        };
        let Some(race) = self.race_mut().filter(|race| race.is_active()) else {
            debug!(player = %name, "answer outside of an active category ignored");
            return out;
        };
        let Some(category) = race.category() else {
            return out;
        };

        let verdict = match category.answer_bank() {
            Some(bank) => {
                let normalized = normalize(answer);
                if !bank.contains(&normalized) {
                    Verdict::Incorrect
                } else if !race.used_answers.insert(normalized) {
                    Verdict::Duplicate
                } else {
                    Verdict::Correct
                }
            }
            None => {
                let solved = parse_number(answer).is_some_and(|value| {
                    race.math_question
                        .as_ref()
                        .is_some_and(|question| question.accepts(value))
                });
                if solved {
                    race.math_question = Some(MathQuestion::generate(&mut rand::rng()));
                    Verdict::Correct
                } else {
                    Verdict::Incorrect
                }
            }
        };
        let next_question = race.math_question.as_ref().map(math_view);

        if verdict == Verdict::Correct {
            self.players[index].score += 1;
        }
        let player = &self.players[index];
        debug!(room_id = %self.id, player = %player.name, ?verdict, "answer scored");

        out.broadcast(ServerMessage::AnswerResult {
            player_name: player.name.clone(),
            answer: (verdict != Verdict::Incorrect).then(|| answer.trim().to_string()),
            is_correct: verdict == Verdict::Correct,
            is_duplicate: verdict == Verdict::Duplicate,
            new_score: player.score,
        });
        out.broadcast(self.scores_message());

        if verdict == Verdict::Correct && category == CategoryId::Math {
            if let Some(math_question) = next_question {
                out.broadcast(ServerMessage::NewMathQuestion { math_question });
            }
        }
        out
    }

    /// Category timer expired: move to the break or finish the race.
    pub(crate) fn end_category(&mut self, out: &mut Outbox) {
        let category_break = self.rules.category_break;
        let Some(race) = self.race_mut().filter(|race| race.is_active()) else {
            return;
        };

        race.used_answers.clear();
        race.math_question = None;
        race.current_index += 1;
        let finished = race.current_index >= CATEGORIES.len();
        if !finished {
            race.phase = RacePhase::Break;
        }

        self.disarm_timed_phase(out);
        self.phase_started_at = None;
        if finished {
            if let Some(race) = self.race_mut() {
                race.phase = RacePhase::Idle;
            }
            self.finish_game(out);
        } else {
            info!(room_id = %self.id, "category ended; break before the next one");
            out.arm(TimerPurpose::Intermission, category_break);
        }
    }

    pub(crate) fn on_category_break_over(&mut self, now: u64, out: &mut Outbox) {
        if self.race().is_some_and(|race| race.phase == RacePhase::Break) {
            self.enter_category(now, out);
        }
    }

    /// Resync: replay the active category to one connection.
    pub(crate) fn push_category_state(&self, conn: ConnId, now: u64, out: &mut Outbox) {
        if let Some(message) = self.category_started(now) {
            out.to_connection(conn, message);
        }
    }

    /// Explicit `request-category`.
    pub fn category_state_for(&self, conn: ConnId, now: u64) -> Outbox {
        let mut out = Outbox::new();
        if self.status == RoomStatus::Playing {
            self.push_category_state(conn, now, &mut out);
        }
        out
    }
}

fn math_view(question: &MathQuestion) -> MathQuestionView {
    MathQuestionView {
        question: question.prompt(),
    }
}
