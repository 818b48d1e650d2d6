//! Live WebSocket connections and the seat each one is bound to.

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    dto::ws::ServerMessage, services::websocket_service::send_message_to_websocket,
    state::outbox::ConnId,
};

/// Seat a connection speaks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Room code.
    pub room_id: String,
    /// Player name as stored in the room.
    pub player_name: String,
}

/// Handle used to push messages to a connected player.
#[derive(Debug, Clone)]
pub struct PlayerConnection {
    /// Writer channel of the socket.
    pub tx: mpsc::UnboundedSender<Message>,
    /// Current seat, if any.
    pub binding: Option<Binding>,
}

/// Registry of every open socket keyed by connection id.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnId, PlayerConnection>,
}

impl ConnectionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly opened socket.
    pub fn register(&self, conn: ConnId, tx: mpsc::UnboundedSender<Message>) {
        self.connections
            .insert(conn, PlayerConnection { tx, binding: None });
    }

    /// Forget a closed socket.
    pub fn unregister(&self, conn: ConnId) -> Option<PlayerConnection> {
        self.connections.remove(&conn).map(|(_, connection)| connection)
    }

    /// Seat currently bound to `conn`.
    pub fn binding(&self, conn: ConnId) -> Option<Binding> {
        self.connections
            .get(&conn)
            .and_then(|connection| connection.binding.clone())
    }

    /// Bind `conn` to a seat, replacing any previous binding.
    pub fn bind(&self, conn: ConnId, room_id: &str, player_name: &str) {
        if let Some(mut connection) = self.connections.get_mut(&conn) {
            connection.binding = Some(Binding {
                room_id: room_id.to_string(),
                player_name: player_name.to_string(),
            });
        }
    }

    /// Clear the binding of `conn` if it still points into `room_id`.
    pub fn release(&self, conn: ConnId, room_id: &str) {
        if let Some(mut connection) = self.connections.get_mut(&conn) {
            if connection
                .binding
                .as_ref()
                .is_some_and(|binding| binding.room_id == room_id)
            {
                connection.binding = None;
            }
        }
    }

    /// Queue `message` on the socket of `conn`; returns whether it was queued.
    pub fn send(&self, conn: ConnId, message: &ServerMessage) -> bool {
        let Some(tx) = self.connections.get(&conn).map(|entry| entry.tx.clone()) else {
            debug!(%conn, "dropping message for closed connection");
            return false;
        };
        send_message_to_websocket(&tx, message).is_ok()
    }

    /// Number of open sockets.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no socket is open.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn bindings_are_released_only_for_their_room() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = Uuid::new_v4();
        registry.register(conn, tx);
        registry.bind(conn, "AB23CD", "Alice");

        registry.release(conn, "ZZZZZZ");
        assert!(registry.binding(conn).is_some());

        registry.release(conn, "AB23CD");
        assert!(registry.binding(conn).is_none());
    }

    #[test]
    fn send_serializes_json_text_frames() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = Uuid::new_v4();
        registry.register(conn, tx);

        assert!(registry.send(conn, &ServerMessage::Kicked));
        match rx.try_recv().unwrap() {
            Message::Text(text) => assert_eq!(text.as_str(), r#"{"type":"kicked"}"#),
            other => panic!("unexpected frame {other:?}"),
        }

        registry.unregister(conn);
        assert!(!registry.send(conn, &ServerMessage::Kicked));
    }
}
