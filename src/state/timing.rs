//! Wall-clock helpers. Remaining time is always derived from a recorded phase
//! start, never from a decrementing counter.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Whole seconds elapsed since `started_at`, never negative.
pub fn elapsed_secs(started_at: u64, now: u64) -> u64 {
    now.saturating_sub(started_at) / 1000
}

/// Whole seconds left in a phase of `duration` that started at `started_at`.
pub fn remaining_secs(started_at: u64, duration: Duration, now: u64) -> u64 {
    duration
        .as_secs()
        .saturating_sub(elapsed_secs(started_at, now))
}
