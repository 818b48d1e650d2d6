/// Leaderboard records and their backends.
pub mod leaderboard;
/// Errors shared by storage backends.
pub mod storage;
