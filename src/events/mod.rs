//! Relay events published to the UI surface
//!
//! Every listening-state transition and every recorded transcript is
//! pushed to subscribed IPC clients as one of these events.

use serde::{Deserialize, Serialize};

use crate::controller::ListeningState;

/// Events pushed to subscribed clients as they happen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    /// The listening state changed
    StatusChanged {
        /// State after the transition
        listening: ListeningState,
    },

    /// A transcript was appended to the command log
    LogEntry {
        /// The transcript as recorded (lower-cased, trimmed)
        transcript: String,
    },
}

impl std::fmt::Display for RelayEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayEvent::StatusChanged { listening } => {
                write!(f, "STATUS_CHANGED ({})", listening)
            }
            RelayEvent::LogEntry { transcript } => {
                write!(f, "LOG_ENTRY ({})", transcript)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        let event = RelayEvent::StatusChanged {
            listening: ListeningState::Active,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("status_changed"));
        assert!(json.contains("active"));
    }

    #[test]
    fn test_log_entry_deserialization() {
        let json = r#"{"type":"log_entry","transcript":"scroll down"}"#;
        let event: RelayEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, RelayEvent::LogEntry { transcript } if transcript == "scroll down"));
    }
}
