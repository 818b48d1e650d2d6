//! Application-level configuration loading, including the timing rules every room follows.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PARTY_ROOMS_CONFIG_PATH";

#[derive(Debug, Clone, Default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    rules: GameRules,
}

/// Limits and durations applied to every room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRules {
    /// Fewest players allowed to start a game.
    pub min_players: usize,
    /// Seats per room.
    pub max_players: usize,
    /// Length of the 3-2-1 countdown, in ticks of one second.
    pub countdown_ticks: u8,
    /// Time allowed per category.
    pub category_duration: Duration,
    /// Pause between two categories.
    pub category_break: Duration,
    /// Time allowed per drawing round.
    pub round_duration: Duration,
    /// Pause between two drawing rounds.
    pub round_break: Duration,
    /// Period of `time-sync` broadcasts.
    pub time_sync_interval: Duration,
    /// How long a disconnected player keeps their seat.
    pub disconnect_grace: Duration,
    /// Inactivity after which a bound seat may be taken over by a rejoin.
    pub stale_binding: Duration,
    /// Wrong guesses allowed per player and round.
    pub guesses_per_round: u8,
    /// Idle time after which a room is dropped.
    pub room_idle_ttl: Duration,
    /// How often idle rooms are swept.
    pub idle_sweep_interval: Duration,
    /// Entries returned by the leaderboard.
    pub leaderboard_size: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 4,
            countdown_ticks: 3,
            category_duration: Duration::from_secs(20),
            category_break: Duration::from_secs(3),
            round_duration: Duration::from_secs(60),
            round_break: Duration::from_secs(5),
            time_sync_interval: Duration::from_secs(5),
            disconnect_grace: Duration::from_secs(30),
            stale_binding: Duration::from_secs(5),
            guesses_per_round: 5,
            room_idle_ttl: Duration::from_secs(600),
            idle_sweep_interval: Duration::from_secs(60),
            leaderboard_size: 10,
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in rules.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        rules = ?app_config.rules,
                        "loaded game rules from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Rules handed to every new room.
    pub fn rules(&self) -> GameRules {
        self.rules
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
/// Every field is optional; absent values keep their default.
struct RawConfig {
    min_players: Option<usize>,
    max_players: Option<usize>,
    countdown_ticks: Option<u8>,
    category_duration_secs: Option<u64>,
    category_break_secs: Option<u64>,
    round_duration_secs: Option<u64>,
    round_break_secs: Option<u64>,
    time_sync_interval_secs: Option<u64>,
    disconnect_grace_secs: Option<u64>,
    stale_binding_ms: Option<u64>,
    guesses_per_round: Option<u8>,
    room_idle_ttl_secs: Option<u64>,
    idle_sweep_interval_secs: Option<u64>,
    leaderboard_size: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = GameRules::default();
        let secs = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_secs).unwrap_or(fallback)
        };

        let max_players = raw.max_players.unwrap_or(defaults.max_players).max(2);
        let rules = GameRules {
            min_players: raw
                .min_players
                .unwrap_or(defaults.min_players)
                .clamp(1, max_players),
            max_players,
            countdown_ticks: raw.countdown_ticks.unwrap_or(defaults.countdown_ticks).max(1),
            category_duration: secs(raw.category_duration_secs, defaults.category_duration),
            category_break: secs(raw.category_break_secs, defaults.category_break),
            round_duration: secs(raw.round_duration_secs, defaults.round_duration),
            round_break: secs(raw.round_break_secs, defaults.round_break),
            time_sync_interval: secs(raw.time_sync_interval_secs, defaults.time_sync_interval)
                .max(Duration::from_secs(1)),
            disconnect_grace: secs(raw.disconnect_grace_secs, defaults.disconnect_grace),
            stale_binding: raw
                .stale_binding_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.stale_binding),
            guesses_per_round: raw
                .guesses_per_round
                .unwrap_or(defaults.guesses_per_round)
                .max(1),
            room_idle_ttl: secs(raw.room_idle_ttl_secs, defaults.room_idle_ttl),
            idle_sweep_interval: secs(raw.idle_sweep_interval_secs, defaults.idle_sweep_interval)
                .max(Duration::from_secs(1)),
            leaderboard_size: raw.leaderboard_size.unwrap_or(defaults.leaderboard_size),
        };

        Self { rules }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
