use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness together with a couple of in-memory gauges.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(state.rooms().len(), state.connections().len())
}
