//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian
//! length. Every request is answered with exactly one response; relay
//! events are additionally pushed to subscribed clients.

use serde::{Deserialize, Serialize};

use crate::controller::ListeningState;

/// Requests from the UI surface to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Begin continuous listening
    StartListening,

    /// Stop listening
    StopListening,

    /// Flip the listening state
    ToggleListening,

    /// Request a status snapshot
    GetStatus,

    /// Request the recorded command log
    GetLog,

    /// Ping to check connectivity
    Ping,

    /// Opt in to pushed relay events
    Subscribe,
}

/// Responses from the daemon to the UI surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Listening state after a start/stop/toggle request
    Ack { listening: ListeningState },

    /// Current daemon status
    Status(ControllerStatus),

    /// Command log snapshot, in recording order
    Log { entries: Vec<String> },

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerStatus {
    /// Daemon version
    pub version: String,

    /// Current listening state
    pub listening: ListeningState,

    /// Number of transcripts recorded this session
    pub log_entries: usize,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let req = Request::StartListening;
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("start_listening"));
    }

    #[test]
    fn test_request_round_trip() {
        let json = r#"{"type":"get_log"}"#;
        let req: Request = serde_json::from_str(json).unwrap();
        assert!(matches!(req, Request::GetLog));
    }

    #[test]
    fn test_ack_serialization() {
        let resp = Response::Ack {
            listening: ListeningState::Active,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("ack"));
        assert!(json.contains("active"));
    }

    #[test]
    fn test_status_serialization() {
        let resp = Response::Status(ControllerStatus {
            version: "0.1.0".to_string(),
            listening: ListeningState::Inactive,
            log_entries: 3,
            uptime_secs: 42,
        });
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("status"));
        assert!(json.contains("inactive"));
    }
}
