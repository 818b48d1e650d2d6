use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::leaderboard::{LeaderboardEntry, LeaderboardResponse, SubmitResultRequest},
    error::AppError,
    services::leaderboard_service,
    state::SharedState,
};

/// Leaderboard query and result submission routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/game/result", post(submit_result))
}

/// Best results across every finished game.
#[utoipa::path(
    get,
    path = "/api/leaderboard",
    tag = "leaderboard",
    responses(
        (status = 200, description = "Top results, highest first", body = LeaderboardResponse),
        (status = 503, description = "Leaderboard storage unavailable")
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(leaderboard_service::top(&state).await?))
}

/// Append one result to the leaderboard.
#[utoipa::path(
    post,
    path = "/api/game/result",
    tag = "leaderboard",
    request_body = SubmitResultRequest,
    responses(
        (status = 200, description = "Result recorded", body = LeaderboardEntry),
        (status = 400, description = "Invalid payload"),
        (status = 503, description = "Leaderboard storage unavailable")
    )
)]
pub async fn submit_result(
    State(state): State<SharedState>,
    Json(payload): Json<SubmitResultRequest>,
) -> Result<Json<LeaderboardEntry>, AppError> {
    payload.validate()?;
    Ok(Json(leaderboard_service::submit(&state, payload).await?))
}
