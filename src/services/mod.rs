/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Leaderboard queries and submissions.
pub mod leaderboard_service;
/// HTTP room creation and seat reservation.
pub mod room_service;
/// Player event dispatch, outbox execution and room timers.
pub mod session_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
