use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status, always "ok" while the process serves requests.
    pub status: String,
    /// Rooms currently held in memory.
    pub active_rooms: usize,
    /// Open WebSocket connections.
    pub connections: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(active_rooms: usize, connections: usize) -> Self {
        Self {
            status: "ok".to_string(),
            active_rooms,
            connections,
        }
    }
}
