use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the party rooms backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::join_room,
        crate::routes::leaderboard::leaderboard,
        crate::routes::leaderboard::submit_result,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::CreateRoomResponse,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::JoinRoomResponse,
            crate::dto::leaderboard::SubmitResultRequest,
            crate::dto::leaderboard::LeaderboardEntry,
            crate::dto::leaderboard::LeaderboardResponse,
            crate::state::room::GameType,
            crate::state::room::RoomStatus,
            crate::state::room::WordMode,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room creation and seat reservation"),
        (name = "leaderboard", description = "Best results across games"),
        (name = "players", description = "WebSocket session for players"),
    )
)]
pub struct ApiDoc;
