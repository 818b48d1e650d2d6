//! Shared application state and the pure room state machine.

pub mod categories;
pub mod connections;
pub mod drawing;
pub mod outbox;
pub mod rematch;
pub mod room;
pub mod scheduler;
pub mod store;
pub mod text;
pub mod timing;
pub mod words;

use std::sync::Arc;

use crate::{config::AppConfig, dao::leaderboard::LeaderboardStore};

use self::{connections::ConnectionRegistry, scheduler::Scheduler, store::RoomStore};

/// Cheaply clonable handle on [`AppState`].
pub type SharedState = Arc<AppState>;

/// Central application state: rooms, live sockets, armed timers and the leaderboard.
pub struct AppState {
    config: AppConfig,
    rooms: RoomStore,
    connections: ConnectionRegistry,
    scheduler: Scheduler,
    leaderboard: Arc<dyn LeaderboardStore>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, leaderboard: Arc<dyn LeaderboardStore>) -> SharedState {
        Arc::new(Self {
            config,
            rooms: RoomStore::new(),
            connections: ConnectionRegistry::new(),
            scheduler: Scheduler::new(),
            leaderboard,
        })
    }

    /// Loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Live rooms.
    pub fn rooms(&self) -> &RoomStore {
        &self.rooms
    }

    /// Open sockets and their seats.
    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// Armed room timers.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Leaderboard backend.
    pub fn leaderboard(&self) -> Arc<dyn LeaderboardStore> {
        self.leaderboard.clone()
    }
}
