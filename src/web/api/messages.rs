//! Inbound message endpoints.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::routing::{normalize_agent_name, SYSTEM_ROLE};
use crate::error::{Error, Result};
use crate::protocol::{Envelope, EnvelopeBuilder};
use crate::web::router::AppState;

pub type ApiResponse = (StatusCode, Json<Value>);

fn success() -> ApiResponse {
    (StatusCode::OK, Json(json!({ "status": "success" })))
}

fn invalid_data() -> ApiResponse {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid Data" })))
}

/// Message request body.
#[derive(Deserialize)]
pub struct KqmlRequest {
    pub sender: String,
    pub performative: String,
    pub receiver: Option<String>,
    pub content: Option<String>,
}

/// Agent action request body.
#[derive(Deserialize)]
pub struct AgentActionRequest {
    pub agent_id: String,
    pub action: String,
}

/// Log line request body.
#[derive(Deserialize)]
pub struct LogMessageRequest {
    pub agent_id: String,
    pub message: String,
    pub log_level: Option<String>,
}

fn parse<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| Error::InvalidMessage(e.to_string()))
}

impl KqmlRequest {
    /// `sender (performative): content` with the names as the client sent them.
    pub fn log_line(&self) -> String {
        format!(
            "{} ({}): {}",
            self.sender,
            self.performative,
            self.content.as_deref().unwrap_or("")
        )
    }

    /// Sender and receiver names are normalized; a missing receiver becomes
    /// the system role and missing content the empty string.
    pub fn into_envelope(self) -> Result<Envelope> {
        let mut builder = EnvelopeBuilder::from(normalize_agent_name(&self.sender))
            .performative(self.performative);
        if let Some(receiver) = self.receiver {
            builder = builder.to(normalize_agent_name(&receiver));
        }
        if let Some(content) = self.content {
            builder = builder.content(content);
        }
        builder.build(SYSTEM_ROLE)
    }
}

/// Validate a message request and turn it into an envelope.
pub fn parse_kqml_request(body: &[u8]) -> Result<Envelope> {
    parse::<KqmlRequest>(body)?.into_envelope()
}

/// Accept a message, log it and put it on the channel.
pub async fn kqml_message(State(state): State<AppState>, body: Bytes) -> ApiResponse {
    let accepted = parse::<KqmlRequest>(&body).and_then(|request| {
        let line = request.log_line();
        request.into_envelope().map(|envelope| (line, envelope))
    });

    match accepted {
        Ok((line, envelope)) => {
            state.channel.enqueue(envelope);
            tracing::info!("{}", line);
            success()
        }
        Err(e) => {
            tracing::debug!("Rejected message: {}", e);
            invalid_data()
        }
    }
}

/// Acknowledge an agent action report.
pub async fn agent_action(body: Bytes) -> ApiResponse {
    match parse::<AgentActionRequest>(&body) {
        Ok(request) => {
            tracing::debug!("{} reported action {}", request.agent_id, request.action);
            success()
        }
        Err(_) => invalid_data(),
    }
}

/// Write a client-supplied line to the log at the requested level.
pub async fn log_message(body: Bytes) -> ApiResponse {
    let request = match parse::<LogMessageRequest>(&body) {
        Ok(request) => request,
        Err(_) => return invalid_data(),
    };

    let level = request
        .log_level
        .as_deref()
        .map(str::to_uppercase)
        .unwrap_or_else(|| "INFO".to_string());

    match level.as_str() {
        "DEBUG" => tracing::debug!("{}: {}", request.agent_id, request.message),
        "WARNING" => tracing::warn!("{}: {}", request.agent_id, request.message),
        "ERROR" | "CRITICAL" => tracing::error!("{}: {}", request.agent_id, request.message),
        _ => tracing::info!("{}: {}", request.agent_id, request.message),
    }
    success()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Performative;

    #[test]
    fn test_parse_full_request() {
        let envelope = parse_kqml_request(
            br#"{"sender":"Camera1","receiver":"Drone1","performative":"inform","content":"Thief detected nearby"}"#,
        )
        .unwrap();

        assert_eq!(envelope.sender(), "CameraAgent");
        assert_eq!(envelope.receiver(), "DroneAgent");
        assert_eq!(envelope.performative(), &Performative::Inform);
        assert_eq!(envelope.content(), "Thief detected nearby");
    }

    #[test]
    fn test_parse_defaults() {
        let envelope = parse_kqml_request(br#"{"sender":"Guard1","performative":"dance"}"#).unwrap();

        assert_eq!(envelope.sender(), "GuardAgent");
        assert_eq!(envelope.receiver(), SYSTEM_ROLE);
        assert_eq!(envelope.content(), "");
        assert_eq!(envelope.performative(), &Performative::Other("dance".to_string()));
    }

    #[test]
    fn test_log_line_keeps_client_names() {
        let request: KqmlRequest =
            parse(br#"{"sender":"Camera1","performative":"inform","content":"Thief detected"}"#).unwrap();
        assert_eq!(request.log_line(), "Camera1 (inform): Thief detected");

        let request: KqmlRequest = parse(br#"{"sender":"Guard1","performative":"dance"}"#).unwrap();
        assert_eq!(request.log_line(), "Guard1 (dance): ");
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let bodies: [&[u8]; 5] = [
            br#"{"performative":"inform"}"#,
            br#"{"sender":"Drone1"}"#,
            br#"{"sender":"","performative":"inform"}"#,
            b"not json",
            b"",
        ];
        for body in bodies {
            assert!(
                matches!(parse_kqml_request(body), Err(Error::InvalidMessage(_))),
                "{:?} should be rejected",
                String::from_utf8_lossy(body)
            );
        }
    }
}
