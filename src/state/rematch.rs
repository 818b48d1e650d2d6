//! Post-game readiness voting and room reset.

use tracing::info;

use crate::{
    dto::ws::{ReadyAction, ServerMessage},
    state::{
        outbox::Outbox,
        room::{Departure, GameType, ModeState, Room, RoomStatus},
    },
};

impl Room {
    /// Handle a `player-ready` vote cast from the results screen.
    pub fn player_ready(
        &mut self,
        name: &str,
        action: ReadyAction,
        game_type: Option<GameType>,
        now: u64,
    ) -> Outbox {
        let mut out = Outbox::new();
        if self.status != RoomStatus::Finished {
            return out;
        }
        let Some(index) = self.player_index(name) else {
            return out;
        };

        match action {
            ReadyAction::Leave => self.remove_player(index, Departure::Left, now, &mut out),
            ReadyAction::Ready => {
                let player_name = self.players[index].name.clone();
                if self.is_host(&player_name) {
                    if let Some(game_type) = game_type {
                        self.next_game_type = Some(game_type);
                    }
                }
                self.players_ready.insert(player_name);
                out.broadcast(self.ready_update());
                self.maybe_restart(now, &mut out);
            }
        }
        out
    }

    /// Current rematch votes.
    pub(crate) fn ready_update(&self) -> ServerMessage {
        ServerMessage::PlayersReadyUpdate {
            players_ready: self.players_ready.iter().cloned().collect(),
            host_game_choice: self.next_game_type,
            total_players: self.players.len(),
        }
    }

    /// Restart once everyone voted and the host picked the next game.
    pub(crate) fn maybe_restart(&mut self, now: u64, out: &mut Outbox) {
        if self.status != RoomStatus::Finished || self.players.is_empty() {
            return;
        }
        let everyone_ready = self
            .players
            .iter()
            .all(|player| self.players_ready.contains(&player.name));
        let Some(next_game_type) = self.next_game_type.filter(|_| everyone_ready) else {
            return;
        };

        for player in &mut self.players {
            player.score = 0;
            player.remaining_guesses = self.rules.guesses_per_round;
        }
        self.mode = ModeState::new(next_game_type);
        self.status = RoomStatus::Waiting;
        self.phase_started_at = None;
        self.players_ready.clear();
        self.next_game_type = None;
        self.last_activity = now;
        info!(room_id = %self.id, game_type = ?next_game_type, host = %self.host_name, "room restarting");

        out.broadcast(self.room_update());
        out.broadcast(ServerMessage::GameRestarting {
            room_id: self.id.clone(),
            game_type: next_game_type,
            host_name: self.host_name.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        outbox::TimerPurpose,
        room::tests::{T0, room_with, sent},
    };

    fn finished_room(names: &[&str]) -> Room {
        let (mut room, _) = room_with(names, GameType::Categories);
        room.start_game(names[0], None, T0);
        room.players[1].score = 4;
        room.finish_game(&mut Outbox::new());
        room
    }

    #[test]
    fn restart_waits_for_host_choice_and_every_vote() {
        let mut room = finished_room(&["Alice", "Bob"]);

        room.player_ready("Bob", ReadyAction::Ready, Some(GameType::Drawing), T0);
        assert_eq!(room.next_game_type, None);

        let out = room.player_ready("Alice", ReadyAction::Ready, None, T0);
        assert_eq!(room.status, RoomStatus::Finished);
        assert!(sent(&out).iter().any(|message| matches!(
            message,
            ServerMessage::PlayersReadyUpdate { total_players: 2, host_game_choice: None, .. }
        )));

        let out = room.player_ready("Alice", ReadyAction::Ready, Some(GameType::Drawing), T0);
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.game_type(), GameType::Drawing);
        assert_eq!(room.host_name, "Alice");
        assert!(room.players.iter().all(|player| player.score == 0));
        assert!(room.players_ready.is_empty());

        let kinds: Vec<_> = sent(&out)
            .into_iter()
            .filter(|message| {
                matches!(
                    message,
                    ServerMessage::RoomUpdate { .. } | ServerMessage::GameRestarting { .. }
                )
            })
            .collect();
        assert!(matches!(
            kinds.as_slice(),
            [ServerMessage::RoomUpdate { .. }, ServerMessage::GameRestarting { .. }]
        ));
    }

    #[test]
    fn leaving_from_results_can_complete_the_vote() {
        let mut room = finished_room(&["Alice", "Bob", "Carol"]);
        room.player_ready("Alice", ReadyAction::Ready, Some(GameType::Categories), T0);
        room.player_ready("Bob", ReadyAction::Ready, None, T0);

        let out = room.player_ready("Carol", ReadyAction::Leave, None, T0);
        assert_eq!(room.players.len(), 2);
        assert_eq!(room.status, RoomStatus::Waiting);
        assert!(
            sent(&out)
                .iter()
                .any(|message| matches!(message, ServerMessage::GameRestarting { .. }))
        );
    }

    #[test]
    fn host_leaving_results_hands_over_and_strips_vote() {
        let mut room = finished_room(&["Alice", "Bob", "Carol"]);
        room.player_ready("Alice", ReadyAction::Ready, Some(GameType::Drawing), T0);
        room.player_ready("Alice", ReadyAction::Leave, None, T0);

        assert_eq!(room.host_name, "Bob");
        assert!(!room.players_ready.contains("Alice"));
        assert_eq!(room.next_game_type, Some(GameType::Drawing));
    }

    #[test]
    fn votes_are_ignored_outside_results() {
        let (mut room, _) = room_with(&["Alice", "Bob"], GameType::Categories);
        assert!(
            room.player_ready("Alice", ReadyAction::Ready, Some(GameType::Drawing), T0)
                .is_empty()
        );
    }

    #[test]
    fn disconnect_strips_ready_vote() {
        let (mut room, conns) = room_with(&["Alice", "Bob"], GameType::Categories);
        room.start_game("Alice", None, T0);
        room.finish_game(&mut Outbox::new());
        room.player_ready("Bob", ReadyAction::Ready, None, T0);

        let out = room.disconnect(conns[1], T0 + 1_000);
        assert!(room.players_ready.is_empty());
        assert!(
            sent(&out)
                .iter()
                .any(|message| matches!(message, ServerMessage::PlayersReadyUpdate { .. }))
        );
        assert!(
            out.timers()
                .iter()
                .any(|command| matches!(command, crate::state::outbox::TimerCommand::Arm {
                    purpose: TimerPurpose::DisconnectGrace(_),
                    ..
                }))
        );
    }
}
