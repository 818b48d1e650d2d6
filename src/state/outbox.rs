//! Side effects produced by room operations.
//!
//! Room methods never touch sockets or timers directly. They describe what must
//! happen in an [`Outbox`], which the session service executes while it still
//! holds the room lock.

use std::time::Duration;

use uuid::Uuid;

use crate::{
    dto::ws::{RankedResult, ServerMessage},
    state::room::Room,
};

/// Identifier assigned to every live WebSocket connection.
pub type ConnId = Uuid;

/// Who should receive an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every bound player of the room.
    Room,
    /// Every bound player except the named one.
    Others(String),
    /// A single player, looked up by name when delivering.
    Player(String),
    /// A connection that may no longer be bound to any player.
    Connection(ConnId),
}

/// Purpose of a scheduled task. One task at most exists per `(room, purpose)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerPurpose {
    /// 3-2-1 countdown tick before a race or the first drawing round.
    Countdown,
    /// Expiry of the active category or drawing round.
    PhaseEnd,
    /// Periodic `time-sync` broadcast while a timed phase runs.
    TimeSync,
    /// Pause between two categories or two drawing rounds.
    Intermission,
    /// Grace window of a disconnected player, keyed by name key.
    DisconnectGrace(String),
}

/// Instruction for the per-room task table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    /// Arm (or re-arm, replacing the previous task) a timer.
    Arm {
        /// Key of the task within the room.
        purpose: TimerPurpose,
        /// Delay before firing.
        after: Duration,
    },
    /// Cancel a timer if it is armed.
    Cancel(TimerPurpose),
}

/// Change to the connection registry requested by a room operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingChange {
    /// Bind the connection to a player of this room.
    Bind {
        /// Connection to bind.
        conn: ConnId,
        /// Player name as stored in the room.
        player_name: String,
    },
    /// Forget whatever binding the connection had in this room.
    Release(ConnId),
}

/// Accumulated side effects of one room operation.
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<(Recipient, ServerMessage)>,
    timers: Vec<TimerCommand>,
    bindings: Vec<BindingChange>,
    results: Option<Vec<RankedResult>>,
}

impl Outbox {
    /// Empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message for every bound player.
    pub fn broadcast(&mut self, message: ServerMessage) {
        self.messages.push((Recipient::Room, message));
    }

    /// Queue a message for every bound player except `name`.
    pub fn broadcast_except(&mut self, name: &str, message: ServerMessage) {
        self.messages.push((Recipient::Others(name.to_string()), message));
    }

    /// Queue a message for one player.
    pub fn to_player(&mut self, name: &str, message: ServerMessage) {
        self.messages.push((Recipient::Player(name.to_string()), message));
    }

    /// Queue a message for one connection, bound or not.
    pub fn to_connection(&mut self, conn: ConnId, message: ServerMessage) {
        self.messages.push((Recipient::Connection(conn), message));
    }

    /// Arm `purpose` to fire after `after`.
    pub fn arm(&mut self, purpose: TimerPurpose, after: Duration) {
        self.timers.push(TimerCommand::Arm { purpose, after });
    }

    /// Cancel `purpose` if armed.
    pub fn cancel(&mut self, purpose: TimerPurpose) {
        self.timers.push(TimerCommand::Cancel(purpose));
    }

    /// Record a binding change for the connection registry.
    pub fn bind(&mut self, conn: ConnId, player_name: &str) {
        self.bindings.push(BindingChange::Bind {
            conn,
            player_name: player_name.to_string(),
        });
    }

    /// Release a connection from this room.
    pub fn release(&mut self, conn: ConnId) {
        self.bindings.push(BindingChange::Release(conn));
    }

    /// Attach final standings of a finished game.
    pub fn finish_with(&mut self, results: Vec<RankedResult>) {
        self.results = Some(results);
    }

    /// Whether nothing at all was produced.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
            && self.timers.is_empty()
            && self.bindings.is_empty()
            && self.results.is_none()
    }

    /// Queued messages with their recipients.
    pub fn messages(&self) -> &[(Recipient, ServerMessage)] {
        &self.messages
    }

    /// Queued timer commands, in order.
    pub fn timers(&self) -> &[TimerCommand] {
        &self.timers
    }

    /// Queued binding changes, in order.
    pub fn bindings(&self) -> &[BindingChange] {
        &self.bindings
    }

    /// Final standings, present when the operation finished a game.
    pub fn results(&self) -> Option<&[RankedResult]> {
        self.results.as_deref()
    }

    /// Split the outbox into deliveries resolved against `room`, timer commands,
    /// binding changes and final standings.
    pub fn resolve(self, room: &Room) -> ResolvedOutbox {
        let deliveries = self
            .messages
            .into_iter()
            .flat_map(|(recipient, message)| {
                room.recipients(&recipient)
                    .into_iter()
                    .map(move |conn| (conn, message.clone()))
            })
            .collect();

        ResolvedOutbox {
            deliveries,
            timers: self.timers,
            bindings: self.bindings,
            results: self.results,
        }
    }
}

/// Outbox whose recipients have been turned into connection identifiers.
#[derive(Debug)]
pub struct ResolvedOutbox {
    /// Messages to push, one per connection.
    pub deliveries: Vec<(ConnId, ServerMessage)>,
    /// Timer commands, in order.
    pub timers: Vec<TimerCommand>,
    /// Registry changes, in order.
    pub bindings: Vec<BindingChange>,
    /// Final standings, when a game finished.
    pub results: Option<Vec<RankedResult>>,
}
