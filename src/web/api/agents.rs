//! Read-side endpoints for agents and the message channel.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::agent::AgentSnapshot;
use crate::core::routing::normalize_agent_name;
use crate::core::ChannelStats;
use crate::web::router::AppState;

/// Current snapshot of every registered agent.
pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentSnapshot>> {
    Json(state.registry.snapshots())
}

/// Current snapshot of a single agent.
pub async fn get_agent(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<AgentSnapshot>, StatusCode> {
    let agent = state
        .registry
        .resolve(&normalize_agent_name(&name))
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(agent.snapshot()))
}

/// Message channel counters.
pub async fn queue_stats(State(state): State<AppState>) -> Json<ChannelStats> {
    Json(state.channel.stats())
}
