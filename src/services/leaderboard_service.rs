use std::time::SystemTime;

use tracing::{info, warn};

use crate::{
    dao::leaderboard::LeaderboardRecord,
    dto::{
        leaderboard::{LeaderboardEntry, LeaderboardResponse, SubmitResultRequest},
        ws::RankedResult,
    },
    error::ServiceError,
    state::{SharedState, room::GameType},
};

/// Best results, limited to the configured leaderboard size.
pub async fn top(state: &SharedState) -> Result<LeaderboardResponse, ServiceError> {
    let limit = state.config().rules().leaderboard_size;
    let records = state.leaderboard().top(limit).await?;
    Ok(LeaderboardResponse {
        entries: records.into_iter().map(LeaderboardEntry::from).collect(),
    })
}

/// Append a client-submitted result.
pub async fn submit(
    state: &SharedState,
    request: SubmitResultRequest,
) -> Result<LeaderboardEntry, ServiceError> {
    let record = LeaderboardRecord {
        player_name: request.player_name.trim().to_string(),
        metric: request.metric,
        game_type: request.game_type.unwrap_or_default(),
        date: SystemTime::now(),
    };
    state.leaderboard().save(record.clone()).await?;
    info!(player = %record.player_name, metric = record.metric, "result submitted");
    Ok(record.into())
}

/// Append the final standings of a finished game in the background.
pub fn record_results(state: &SharedState, game_type: GameType, results: Vec<RankedResult>) {
    let store = state.leaderboard();
    tokio::spawn(async move {
        let date = SystemTime::now();
        for result in results {
            let record = LeaderboardRecord {
                player_name: result.name,
                metric: result.score,
                game_type,
                date,
            };
            if let Err(err) = store.save(record).await {
                warn!(error = %err, "failed to record final standing");
            }
        }
    });
}
