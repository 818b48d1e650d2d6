//! Player sessions: routes WebSocket events onto rooms and carries out the
//! side effects each room operation describes.
//!
//! Every handler locks the room, runs one pure room operation and executes the
//! returned [`Outbox`] before releasing the lock. Timers armed here re-enter
//! through [`on_timer`], which must claim its token under the same lock.

use std::time::Duration;

use futures::FutureExt;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::{
    dto::ws::{ClientMessage, ErrorCode, ServerMessage},
    services::leaderboard_service,
    state::{
        SharedState,
        outbox::{BindingChange, ConnId, Outbox, ResolvedOutbox, TimerCommand, TimerPurpose},
        room::{JoinError, Room},
        store::canonical_room_id,
        text::name_key,
        timing::epoch_millis,
    },
};

/// Parse one inbound text frame and dispatch it.
pub async fn handle_text(state: &SharedState, conn: ConnId, text: &str) {
    match ClientMessage::from_json_str(text) {
        Ok(message) => dispatch(state, conn, message).await,
        Err(err) => {
            warn!(%conn, error = %err, "malformed client frame dropped");
            state.connections().send(
                conn,
                &ServerMessage::error(ErrorCode::Malformed, "message could not be parsed"),
            );
        }
    }
}

/// Route a parsed client event to the room the connection speaks for.
pub async fn dispatch(state: &SharedState, conn: ConnId, message: ClientMessage) {
    match message {
        ClientMessage::JoinRoom {
            room_id,
            player_name,
        } => join_room(state, conn, &room_id, &player_name).await,
        ClientMessage::Unknown => warn!(%conn, "unknown client event dropped"),
        message => handle_seated(state, conn, message).await,
    }
}

/// Bind `conn` to a seat of `room_id`, moving it out of any other seat first.
pub async fn join_room(state: &SharedState, conn: ConnId, room_id: &str, player_name: &str) {
    if let Some(binding) = state.connections().binding(conn) {
        let same_seat = binding.room_id == canonical_room_id(room_id)
            && name_key(&binding.player_name) == name_key(player_name);
        if !same_seat {
            debug!(%conn, from = %binding.room_id, "connection switching seats");
            disconnect(state, conn).await;
        }
    }

    let Some(handle) = state.rooms().get(room_id) else {
        info!(%conn, room_id = %room_id, "join for unknown room");
        send_not_found(state, conn, room_id);
        return;
    };

    let mut room = handle.lock().await;
    if room.closed {
        send_not_found(state, conn, room_id);
        return;
    }

    match room.join(conn, player_name, epoch_millis()) {
        Ok(out) => execute(state, &mut room, out),
        Err(rejection) => {
            info!(room_id = %room.id, player = %player_name, error = %rejection, "join rejected");
            state.connections().send(
                conn,
                &ServerMessage::error(error_code(rejection), rejection.to_string()),
            );
        }
    }
}

/// Transport closed (or the connection moved elsewhere): start the grace window of its seat.
pub async fn disconnect(state: &SharedState, conn: ConnId) {
    let Some(binding) = state.connections().binding(conn) else {
        return;
    };
    state.connections().release(conn, &binding.room_id);

    let Some(handle) = state.rooms().get(&binding.room_id) else {
        return;
    };
    let mut room = handle.lock().await;
    if room.closed {
        return;
    }
    let out = room.disconnect(conn, epoch_millis());
    execute(state, &mut room, out);
}

async fn handle_seated(state: &SharedState, conn: ConnId, message: ClientMessage) {
    let kind = message.kind();
    let Some(binding) = state.connections().binding(conn) else {
        warn!(%conn, kind, "event from a connection without a seat dropped");
        return;
    };
    let Some(handle) = state.rooms().get(&binding.room_id) else {
        state.connections().release(conn, &binding.room_id);
        send_not_found(state, conn, &binding.room_id);
        return;
    };

    let mut room = handle.lock().await;
    if room.closed {
        send_not_found(state, conn, &binding.room_id);
        return;
    }
    let Some(name) = room.player_by_connection(conn).map(|player| player.name.clone()) else {
        warn!(%conn, room_id = %room.id, kind, "seat no longer held by connection; event dropped");
        state.connections().release(conn, &room.id);
        return;
    };

    let now = epoch_millis();
    room.touch(&name, now);
    let out = match message {
        ClientMessage::LeaveRoom { .. } | ClientMessage::PlayerLeave { .. } => room.leave(&name, now),
        ClientMessage::KickPlayer { player_name, .. } => room.kick(&name, &player_name, now),
        ClientMessage::StartGame { word_mode } => room.start_game(&name, word_mode, now),
        ClientMessage::ChangeWordMode { word_mode } => room.change_word_mode(&name, word_mode),
        ClientMessage::ChangeGameType { game_type } => {
            room.change_game_type(&name, conn, game_type)
        }
        ClientMessage::SubmitWord { word } => room.submit_word(&name, &word),
        ClientMessage::StartEditingWord => room.start_editing_word(&name),
        ClientMessage::SubmitAnswer { answer } => room.submit_answer(&name, &answer),
        ClientMessage::SubmitGuess { guess } => room.submit_guess(&name, &guess, now),
        ClientMessage::Draw { draw_data } => room.draw(&name, draw_data),
        ClientMessage::ClearCanvas => room.clear_canvas(&name),
        ClientMessage::PlayerReady { action, game_type } => {
            room.player_ready(&name, action, game_type, now)
        }
        ClientMessage::GetRoomState { .. } => room.room_state_for(conn),
        ClientMessage::GetScores { .. } => room.scores_for(conn),
        ClientMessage::RequestCategory { .. } => room.category_state_for(conn, now),
        ClientMessage::RequestDrawingState { .. } => room.drawing_state_for(conn, now),
        ClientMessage::JoinRoom { .. } | ClientMessage::Unknown => Outbox::new(),
    };

    if out.is_empty() {
        debug!(room_id = %room.id, player = %name, kind, "event produced no effect");
    }
    execute(state, &mut room, out);
}

/// Fire a scheduled room timer. Superseded or cancelled timers lose the token check and do nothing.
pub async fn on_timer(state: &SharedState, room_id: &str, purpose: TimerPurpose, token: u64) {
    let Some(handle) = state.rooms().get(room_id) else {
        return;
    };
    let mut room = handle.lock().await;
    if room.closed || !state.scheduler().complete(room_id, &purpose, token) {
        debug!(room_id = %room_id, ?purpose, token, "stale timer ignored");
        return;
    }

    debug!(room_id = %room_id, ?purpose, token, "timer fired");
    let out = room.on_timer(&purpose, epoch_millis());
    execute(state, &mut room, out);
}

/// Carry out an outbox produced by `room`. Must run while the room lock is held.
pub(crate) fn execute(state: &SharedState, room: &mut Room, out: Outbox) {
    let ResolvedOutbox {
        deliveries,
        timers,
        bindings,
        results,
    } = out.resolve(room);

    for (conn, message) in deliveries {
        state.connections().send(conn, &message);
    }

    for change in bindings {
        match change {
            BindingChange::Bind { conn, player_name } => {
                state.connections().bind(conn, &room.id, &player_name)
            }
            BindingChange::Release(conn) => state.connections().release(conn, &room.id),
        }
    }

    for command in timers {
        match command {
            TimerCommand::Arm { purpose, after } => arm_timer(state, &room.id, purpose, after),
            TimerCommand::Cancel(purpose) => state.scheduler().cancel(&room.id, &purpose),
        }
    }

    if let Some(results) = results {
        leaderboard_service::record_results(state, room.game_type(), results);
    }

    if room.is_empty() && !room.closed {
        close_room(state, room);
    }
}

fn arm_timer(state: &SharedState, room_id: &str, purpose: TimerPurpose, after: Duration) {
    let task_state = state.clone();
    let task_room = room_id.to_string();
    let task_purpose = purpose.clone();
    state.scheduler().arm(room_id, purpose, after, move |token| {
        async move { on_timer(&task_state, &task_room, task_purpose, token).await }.boxed()
    });
}

/// Mark the room closed, forget it and drop every timer it armed.
fn close_room(state: &SharedState, room: &mut Room) {
    room.closed = true;
    state.scheduler().cancel_room(&room.id);
    state.rooms().remove(&room.id);
}

/// Periodically expire rooms that saw no activity for longer than their TTL.
pub async fn run_idle_sweeper(state: SharedState) {
    let mut ticker = interval(state.config().rules().idle_sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let swept = sweep_idle_rooms(&state, epoch_millis()).await;
        if swept > 0 {
            info!(swept, remaining = state.rooms().len(), "idle rooms expired");
        }
    }
}

/// Close every room idle at `now`; returns how many were closed.
pub async fn sweep_idle_rooms(state: &SharedState, now: u64) -> usize {
    let mut swept = 0;
    for id in state.rooms().ids() {
        let Some(handle) = state.rooms().get(&id) else {
            continue;
        };
        let mut room = handle.lock().await;
        if room.closed || !room.is_idle(now) {
            continue;
        }

        info!(room_id = %room.id, players = room.players.len(), "room idle; closing");
        for conn in room.players.iter().filter_map(|player| player.connection_id) {
            state.connections().release(conn, &room.id);
        }
        close_room(state, &mut room);
        swept += 1;
    }
    swept
}

fn send_not_found(state: &SharedState, conn: ConnId, room_id: &str) {
    state.connections().send(
        conn,
        &ServerMessage::error(ErrorCode::NotFound, format!("room `{room_id}` not found")),
    );
}

fn error_code(rejection: JoinError) -> ErrorCode {
    match rejection {
        JoinError::DuplicateName => ErrorCode::DuplicateName,
        JoinError::RoomFull => ErrorCode::Full,
        JoinError::AlreadyStarted => ErrorCode::AlreadyStarted,
        JoinError::InvalidName(_) => ErrorCode::InvalidName,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::ws::Message;
    use serde_json::Value;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::leaderboard::InMemoryLeaderboard,
        state::{AppState, room::GameType},
    };

    fn app_state() -> SharedState {
        AppState::new(AppConfig::default(), Arc::new(InMemoryLeaderboard::new()))
    }

    fn connect(state: &SharedState) -> (ConnId, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Uuid::new_v4();
        state.connections().register(conn, tx);
        (conn, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<Value> {
        let mut events = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            if let Message::Text(text) = frame {
                events.push(serde_json::from_str(text.as_str()).unwrap());
            }
        }
        events
    }

    fn types(events: &[Value]) -> Vec<&str> {
        events
            .iter()
            .map(|event| event["type"].as_str().unwrap())
            .collect()
    }

    fn open_room(state: &SharedState, host: &str, game_type: GameType) -> String {
        let rules = state.config().rules();
        let (id, _) = state
            .rooms()
            .create(host, game_type, rules, epoch_millis())
            .unwrap();
        id
    }

    #[tokio::test]
    async fn joining_an_unknown_room_reports_not_found() {
        let state = app_state();
        let (conn, mut rx) = connect(&state);

        join_room(&state, conn, "ZZZZZZ", "Alice").await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "error");
        assert_eq!(events[0]["code"], "not-found");
        assert!(state.connections().binding(conn).is_none());
    }

    #[tokio::test]
    async fn host_claims_reserved_seat_and_guest_joins() {
        let state = app_state();
        let room_id = open_room(&state, "Alice", GameType::Categories);
        let (host, mut host_rx) = connect(&state);
        let (guest, mut guest_rx) = connect(&state);

        join_room(&state, host, &room_id.to_lowercase(), "alice").await;
        join_room(&state, guest, &room_id, "Bob").await;

        let binding = state.connections().binding(host).unwrap();
        assert_eq!(binding.room_id, room_id);
        assert_eq!(binding.player_name, "Alice");

        let host_events = drain(&mut host_rx);
        let last_update = host_events
            .iter()
            .rev()
            .find(|event| event["type"] == "room-update")
            .unwrap();
        assert_eq!(last_update["players"].as_array().unwrap().len(), 2);
        assert_eq!(last_update["hostName"], "Alice");
        assert!(types(&drain(&mut guest_rx)).contains(&"scores-update"));
    }

    #[tokio::test]
    async fn duplicate_live_name_is_rejected_with_code() {
        let state = app_state();
        let room_id = open_room(&state, "Alice", GameType::Categories);
        let (first, _first_rx) = connect(&state);
        let (second, mut second_rx) = connect(&state);

        join_room(&state, first, &room_id, "Alice").await;
        join_room(&state, second, &room_id, "ALICE").await;

        let events = drain(&mut second_rx);
        assert_eq!(events.last().unwrap()["code"], "duplicate-name");
        assert!(state.connections().binding(second).is_none());
    }

    #[tokio::test]
    async fn malformed_frames_get_an_error_event() {
        let state = app_state();
        let (conn, mut rx) = connect(&state);

        handle_text(&state, conn, "{not json").await;

        let events = drain(&mut rx);
        assert_eq!(events[0]["code"], "malformed");
    }

    #[tokio::test]
    async fn events_without_a_seat_are_dropped() {
        let state = app_state();
        let (conn, mut rx) = connect(&state);

        handle_text(&state, conn, r#"{"type":"submit-answer","answer":"cat"}"#).await;

        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn last_player_leaving_deletes_the_room() {
        let state = app_state();
        let room_id = open_room(&state, "Alice", GameType::Categories);
        let (conn, _rx) = connect(&state);
        join_room(&state, conn, &room_id, "Alice").await;

        handle_text(&state, conn, r#"{"type":"leave-room"}"#).await;

        assert!(state.rooms().get(&room_id).is_none());
        assert!(state.connections().binding(conn).is_none());
    }

    #[tokio::test]
    async fn start_game_arms_the_countdown() {
        let state = app_state();
        let room_id = open_room(&state, "Alice", GameType::Categories);
        let (host, mut host_rx) = connect(&state);
        let (guest, _guest_rx) = connect(&state);
        join_room(&state, host, &room_id, "Alice").await;
        join_room(&state, guest, &room_id, "Bob").await;
        drain(&mut host_rx);

        handle_text(&state, host, r#"{"type":"start-game"}"#).await;

        let events = drain(&mut host_rx);
        assert!(
            events
                .iter()
                .any(|event| event["type"] == "countdown" && event["value"] == 3)
        );
        assert!(state.scheduler().is_armed(&room_id, &TimerPurpose::Countdown));
    }

    #[tokio::test(start_paused = true)]
    async fn grace_expiry_removes_the_seat_and_empties_the_room() {
        let state = app_state();
        let room_id = open_room(&state, "Alice", GameType::Categories);
        let (host, _host_rx) = connect(&state);
        let (guest, mut guest_rx) = connect(&state);
        join_room(&state, host, &room_id, "Alice").await;
        join_room(&state, guest, &room_id, "Bob").await;
        drain(&mut guest_rx);

        disconnect(&state, host).await;
        let events = drain(&mut guest_rx);
        assert_eq!(events[0]["type"], "player-disconnected");
        assert!(state.scheduler().is_armed(
            &room_id,
            &TimerPurpose::DisconnectGrace(name_key("Alice"))
        ));

        tokio::time::sleep(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;

        let events = drain(&mut guest_rx);
        let kinds = types(&events);
        assert!(kinds.contains(&"player-left-permanently"));
        assert!(kinds.contains(&"host-changed"));

        disconnect(&state, guest).await;
        tokio::time::sleep(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;
        assert!(state.rooms().get(&room_id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn rejoin_within_grace_keeps_the_seat() {
        let state = app_state();
        let room_id = open_room(&state, "Alice", GameType::Categories);
        let (host, _host_rx) = connect(&state);
        let (guest, mut guest_rx) = connect(&state);
        join_room(&state, host, &room_id, "Alice").await;
        join_room(&state, guest, &room_id, "Bob").await;

        disconnect(&state, host).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        let (again, _again_rx) = connect(&state);
        join_room(&state, again, &room_id, "Alice").await;
        drain(&mut guest_rx);

        tokio::time::sleep(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;

        let kinds = drain(&mut guest_rx);
        assert!(!types(&kinds).contains(&"player-left-permanently"));
        let handle = state.rooms().get(&room_id).unwrap();
        let room = handle.lock().await;
        assert_eq!(room.players.len(), 2);
        assert_eq!(room.host_name, "Alice");
    }

    #[tokio::test]
    async fn sweeper_closes_idle_rooms_only() {
        let state = app_state();
        let idle = open_room(&state, "Alice", GameType::Categories);
        let (conn, _rx) = connect(&state);
        join_room(&state, conn, &idle, "Alice").await;

        let ttl = state.config().rules().room_idle_ttl.as_millis() as u64;
        let swept = sweep_idle_rooms(&state, epoch_millis() + ttl / 2).await;
        assert_eq!(swept, 0);

        let swept = sweep_idle_rooms(&state, epoch_millis() + ttl + 1_000).await;
        assert_eq!(swept, 1);
        assert!(state.rooms().get(&idle).is_none());
        assert!(state.connections().binding(conn).is_none());
    }
}
