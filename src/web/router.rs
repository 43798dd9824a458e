//! Route definitions for the message gateway.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::api;
use crate::core::{AgentRegistry, MessageChannel};
use crate::sim::Simulation;

/// Shared handles the endpoints work with.
#[derive(Clone)]
pub struct AppState {
    pub channel: Arc<MessageChannel>,
    pub registry: Arc<AgentRegistry>,
}

impl AppState {
    pub fn new(channel: Arc<MessageChannel>, registry: Arc<AgentRegistry>) -> Self {
        Self { channel, registry }
    }
}

impl From<&Simulation> for AppState {
    fn from(sim: &Simulation) -> Self {
        Self::new(sim.channel().clone(), sim.registry().clone())
    }
}

/// Create the full app router.
pub fn create_app_router(state: AppState) -> Router {
    Router::new()
        // Inbound
        .route("/kqml_message", post(api::kqml_message))
        .route("/agent_action", post(api::agent_action))
        .route("/log_message", post(api::log_message))
        // Read side
        .route("/agents", get(api::list_agents))
        .route("/agents/:name", get(api::get_agent))
        .route("/queue", get(api::queue_stats))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState::new(
            Arc::new(MessageChannel::new()),
            Arc::new(AgentRegistry::standard(&Settings::default())),
        )
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_kqml_message_enqueues() {
        let state = state();
        let app = create_app_router(state.clone());

        let response = app
            .oneshot(post_json(
                "/kqml_message",
                r#"{"sender":"Camera1","receiver":"Drone1","performative":"inform","content":"Thief detected nearby"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "success");

        let queued = state.channel.drain_all();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].sender(), "CameraAgent");
        assert_eq!(queued[0].receiver(), "DroneAgent");
    }

    #[tokio::test]
    async fn test_kqml_message_rejects_missing_performative() {
        let state = state();
        let app = create_app_router(state.clone());

        let response = app
            .oneshot(post_json("/kqml_message", r#"{"sender":"Camera1"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid Data");
        assert!(state.channel.is_empty());
    }

    #[tokio::test]
    async fn test_kqml_message_logs_client_names() {
        let (_guard, logs) = crate::logging::capture("dronewatch=info");
        let state = state();

        let response = create_app_router(state.clone())
            .oneshot(post_json(
                "/kqml_message",
                r#"{"sender":"Camera1","performative":"inform","content":"Thief detected"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let output = logs.contents();
        assert!(output.contains("INFO"), "{}", output);
        assert!(output.contains("Camera1 (inform): Thief detected"), "{}", output);
        // Queued under the normalized name, with nothing delivered yet.
        assert_eq!(state.channel.drain_all()[0].sender(), "CameraAgent");
    }

    #[tokio::test]
    async fn test_agent_action() {
        let ok = create_app_router(state())
            .oneshot(post_json("/agent_action", r#"{"agent_id":"Drone1","action":"takeoff"}"#))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let bad = create_app_router(state())
            .oneshot(post_json("/agent_action", r#"{"agent_id":"Drone1"}"#))
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_log_message_levels() {
        for body in [
            r#"{"agent_id":"Drone1","message":"low battery","log_level":"warning"}"#,
            r#"{"agent_id":"Drone1","message":"hello","log_level":"LOUD"}"#,
            r#"{"agent_id":"Drone1","message":"hello"}"#,
        ] {
            let response = create_app_router(state())
                .oneshot(post_json("/log_message", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", body);
        }

        let missing = create_app_router(state())
            .oneshot(post_json("/log_message", r#"{"message":"hello"}"#))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_agents_and_queue() {
        let state = state();
        let app = create_app_router(state.clone());

        let response = app
            .clone()
            .oneshot(Request::get("/agents").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let agents = body_json(response).await;
        assert_eq!(agents.as_array().unwrap().len(), 4);

        let response = app
            .clone()
            .oneshot(Request::get("/agents/Drone1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["battery"], 100.0);

        let response = app
            .clone()
            .oneshot(Request::get("/agents/Nobody").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        state
            .channel
            .enqueue(crate::protocol::Envelope::new("A", "B", "inform", ""));
        let response = app
            .oneshot(Request::get("/queue").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let stats = body_json(response).await;
        assert_eq!(stats["pending"], 1);
        assert_eq!(stats["enqueued"], 1);
    }

    #[tokio::test]
    async fn test_health() {
        let response = create_app_router(state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
