use std::{cmp::Reverse, sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::{
    dao::storage::{StorageError, StorageResult},
    state::room::GameType,
};

/// One result submitted to the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRecord {
    /// Display name of the player.
    pub player_name: String,
    /// Score reached; higher is better.
    pub metric: u32,
    /// Minigame the score was earned in.
    pub game_type: GameType,
    /// When the result was recorded.
    pub date: SystemTime,
}

/// Abstraction over where leaderboard records are kept.
pub trait LeaderboardStore: Send + Sync {
    /// Append a record.
    fn save(&self, record: LeaderboardRecord) -> BoxFuture<'static, StorageResult<()>>;
    /// Best `limit` records, highest metric first; ties keep submission order.
    fn top(&self, limit: usize) -> BoxFuture<'static, StorageResult<Vec<LeaderboardRecord>>>;
}

/// Process-local, append-only leaderboard; records are lost on restart.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLeaderboard {
    records: Arc<RwLock<Vec<LeaderboardRecord>>>,
}

impl InMemoryLeaderboard {
    /// Empty leaderboard.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeaderboardStore for InMemoryLeaderboard {
    fn save(&self, record: LeaderboardRecord) -> BoxFuture<'static, StorageResult<()>> {
        let records = self.records.clone();
        Box::pin(async move {
            if record.player_name.trim().is_empty() {
                return Err(StorageError::Rejected("player name is empty".into()));
            }
            records.write().await.push(record);
            Ok(())
        })
    }

    fn top(&self, limit: usize) -> BoxFuture<'static, StorageResult<Vec<LeaderboardRecord>>> {
        let records = self.records.clone();
        Box::pin(async move {
            let mut ranked = records.read().await.clone();
            ranked.sort_by_key(|record| Reverse(record.metric));
            ranked.truncate(limit);
            Ok(ranked)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, metric: u32) -> LeaderboardRecord {
        LeaderboardRecord {
            player_name: name.into(),
            metric,
            game_type: GameType::Categories,
            date: SystemTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn top_returns_best_first_and_respects_limit() {
        let store = InMemoryLeaderboard::new();
        store.save(record("Alice", 3)).await.unwrap();
        store.save(record("Bob", 9)).await.unwrap();
        store.save(record("Carol", 3)).await.unwrap();

        let names: Vec<_> = store
            .top(2)
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.player_name)
            .collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let store = InMemoryLeaderboard::new();
        assert!(matches!(
            store.save(record("  ", 1)).await,
            Err(StorageError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn every_saved_record_is_kept() {
        let store = InMemoryLeaderboard::new();
        store.save(record("Low", 0)).await.unwrap();
        for _ in 0..1_500 {
            store.save(record("High", 5)).await.unwrap();
        }

        let all = store.top(usize::MAX).await.unwrap();
        assert_eq!(all.len(), 1_501);
        assert_eq!(all.last().map(|record| record.player_name.as_str()), Some("Low"));
    }
}
