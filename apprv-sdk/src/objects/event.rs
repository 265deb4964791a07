//! Event DTOs for the HTTP API.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Derived status of an approval event.
///
/// This is never authoritative on its own: it is recomputed from the
/// responses and the deadline every time an event is loaded or mutated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    #[default]
    InProgress,
    Approved,
    Rejected,
    Timeout,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::InProgress => write!(f, "in-progress"),
            EventStatus::Approved => write!(f, "approved"),
            EventStatus::Rejected => write!(f, "rejected"),
            EventStatus::Timeout => write!(f, "timeout"),
        }
    }
}

/// Request body for `POST /events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEventRequest {
    /// Unix timestamp (seconds) after which an unanswered event times out.
    pub timeout_epoch: i64,
}

/// Response body for `POST /events` and `GET /events/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: String,
    pub timeout_epoch: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub approvers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rejecters: Vec<String>,
    pub status: EventStatus,
}

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&EventStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            serde_json::from_str::<EventStatus>("\"timeout\"").unwrap(),
            EventStatus::Timeout
        );
        assert_eq!(EventStatus::Rejected.to_string(), "rejected");
    }

    #[test]
    fn test_null_lists_decode_as_empty() {
        let json = r#"{"id":"abc","timeout_epoch":10,"approvers":["U1"],"rejecters":null,"status":"approved"}"#;
        let event: EventResponse = serde_json::from_str(json).unwrap();
        assert_eq!(event.approvers, vec!["U1".to_string()]);
        assert!(event.rejecters.is_empty());
    }
}
