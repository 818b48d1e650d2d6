//! In-memory table of live rooms.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use rand::{Rng, seq::IndexedRandom};
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    config::GameRules,
    dto::validation::ROOM_ID_ALPHABET,
    state::room::{GameType, JoinError, Room},
};

const ROOM_ID_LENGTH: usize = 6;

/// Shared handle on one room. Every mutation runs under its lock.
pub type RoomHandle = Arc<Mutex<Room>>;

/// Room identifier to room.
#[derive(Default)]
pub struct RoomStore {
    rooms: DashMap<String, RoomHandle>,
}

impl RoomStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a room with a fresh unique code, reserving the host seat for `host_name`.
    pub fn create(
        &self,
        host_name: &str,
        game_type: GameType,
        rules: GameRules,
        now: u64,
    ) -> Result<(String, RoomHandle), JoinError> {
        let mut rng = rand::rng();
        loop {
            let id = generate_room_id(&mut rng);
            if let Entry::Vacant(slot) = self.rooms.entry(id.clone()) {
                let room = Room::new(id.clone(), host_name, game_type, rules, now)?;
                let handle = Arc::new(Mutex::new(room));
                slot.insert(handle.clone());
                info!(room_id = %id, host = %host_name, ?game_type, "room created");
                return Ok((id, handle));
            }
        }
    }

    /// Look up a room; codes are matched case-insensitively.
    pub fn get(&self, id: &str) -> Option<RoomHandle> {
        self.rooms
            .get(&canonical_room_id(id))
            .map(|entry| entry.value().clone())
    }

    /// Drop a room from the table.
    pub fn remove(&self, id: &str) -> Option<RoomHandle> {
        let removed = self.rooms.remove(&canonical_room_id(id)).map(|(_, handle)| handle);
        if removed.is_some() {
            info!(room_id = %id, "room deleted");
        }
        removed
    }

    /// Snapshot of every room code.
    pub fn ids(&self) -> Vec<String> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no room is live.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// Upper-cased, trimmed room code.
pub fn canonical_room_id(id: &str) -> String {
    id.trim().to_ascii_uppercase()
}

/// Six random characters from the room code alphabet.
pub fn generate_room_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let alphabet: Vec<char> = ROOM_ID_ALPHABET.chars().collect();
    (0..ROOM_ID_LENGTH)
        .filter_map(|_| alphabet.choose(rng).copied())
        .collect()
}
