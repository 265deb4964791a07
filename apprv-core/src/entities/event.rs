//! The approval event and its status derivation.

use crate::framework::StoreProcessor;
use crate::id::{EVENT_ID_LENGTH, EntropyError, EntropySource, generate_id};
use crate::store::StoreError;
use apprv_sdk::objects::{EventResponse, EventStatus, null_as_default};
use kanau::processor::Processor;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One approval request and the responses it has collected.
///
/// `id` and `timeout_epoch` are fixed at creation. Responses are only ever
/// appended. `status` is derived and is refreshed after every load and every
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    id: String,
    timeout_epoch: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    approvers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    rejecters: Vec<String>,
    #[serde(default)]
    status: EventStatus,
}

impl Event {
    /// Create an event with a fresh random id.
    pub fn new(timeout_epoch: i64, entropy: &dyn EntropySource) -> Result<Self, EntropyError> {
        let id = generate_id(entropy, EVENT_ID_LENGTH)?;
        Ok(Self::with_id(id, timeout_epoch))
    }

    /// Create an event under a caller-chosen id.
    pub fn with_id(id: impl Into<String>, timeout_epoch: i64) -> Self {
        let mut event = Self {
            id: id.into(),
            timeout_epoch,
            approvers: Vec::new(),
            rejecters: Vec::new(),
            status: EventStatus::InProgress,
        };
        event.refresh_status();
        event
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timeout_epoch(&self) -> i64 {
        self.timeout_epoch
    }

    pub fn approvers(&self) -> &[String] {
        &self.approvers
    }

    pub fn rejecters(&self) -> &[String] {
        &self.rejecters
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    /// Record an approval. The same user may approve more than once.
    pub fn approve(&mut self, user_id: impl Into<String>) {
        self.approvers.push(user_id.into());
        self.refresh_status();
    }

    /// Record a rejection. The same user may reject more than once.
    pub fn reject(&mut self, user_id: impl Into<String>) {
        self.rejecters.push(user_id.into());
        self.refresh_status();
    }

    /// Recompute `status` against the current wall clock.
    pub fn refresh_status(&mut self) {
        self.refresh_status_at(OffsetDateTime::now_utc());
    }

    pub fn refresh_status_at(&mut self, now: OffsetDateTime) {
        self.status = self.status_at(now);
    }

    /// Rejection beats approval, approval beats timeout.
    pub fn status_at(&self, now: OffsetDateTime) -> EventStatus {
        if !self.rejecters.is_empty() {
            EventStatus::Rejected
        } else if !self.approvers.is_empty() {
            EventStatus::Approved
        } else if self.is_past_deadline(now) {
            EventStatus::Timeout
        } else {
            EventStatus::InProgress
        }
    }

    /// Strictly after `timeout_epoch`; the deadline second itself is not late.
    pub fn is_past_deadline(&self, now: OffsetDateTime) -> bool {
        now.unix_timestamp_nanos() > i128::from(self.timeout_epoch) * 1_000_000_000
    }

    /// Serialize into the stored representation.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(self).map_err(|source| StoreError::Encode {
            key: self.id.clone(),
            source,
        })
    }

    /// Deserialize a stored record and refresh its status.
    pub fn from_bytes(key: &str, bytes: &[u8]) -> Result<Self, StoreError> {
        let mut event: Event =
            serde_json::from_slice(bytes).map_err(|source| StoreError::Decode {
                key: key.to_owned(),
                source,
            })?;
        event.refresh_status();
        Ok(event)
    }
}

impl From<&Event> for EventResponse {
    fn from(event: &Event) -> Self {
        EventResponse {
            id: event.id.clone(),
            timeout_epoch: event.timeout_epoch,
            approvers: event.approvers.clone(),
            rejecters: event.rejecters.clone(),
            status: event.status,
        }
    }
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        EventResponse {
            id: event.id,
            timeout_epoch: event.timeout_epoch,
            approvers: event.approvers,
            rejecters: event.rejecters,
            status: event.status,
        }
    }
}

// ---------------------------------------------------------------------------
// Store requests
// ---------------------------------------------------------------------------

/// Load an event by id. Resolves to `None` if no record exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetEventById {
    pub id: String,
}

/// Write an event under its own id, overwriting any previous record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutEvent {
    pub event: Event,
}

impl Processor<GetEventById> for StoreProcessor {
    type Output = Option<Event>;
    type Error = StoreError;

    async fn process(&self, query: GetEventById) -> Result<Option<Event>, StoreError> {
        let Some(bytes) = self.store.get(&query.id).await? else {
            return Ok(None);
        };
        Event::from_bytes(&query.id, &bytes).map(Some)
    }
}

impl Processor<PutEvent> for StoreProcessor {
    type Output = Event;
    type Error = StoreError;

    async fn process(&self, put: PutEvent) -> Result<Event, StoreError> {
        let bytes = put.event.to_bytes()?;
        self.store.set(&put.event.id, bytes).await?;
        Ok(put.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::testing::{FailingEntropy, FixedEntropy};
    use crate::store::MemoryKeyValueStore;
    use std::sync::Arc;
    use time::Duration;

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    #[test]
    fn test_new_event_is_in_progress_then_approved_then_rejected() {
        let timeout = now().unix_timestamp() + 3600;
        let mut event = Event::new(timeout, &FixedEntropy(vec![3, 70, 140])).unwrap();
        assert_eq!(event.id().len(), EVENT_ID_LENGTH);
        assert_eq!(event.status(), EventStatus::InProgress);

        event.approve("U1");
        assert_eq!(event.status(), EventStatus::Approved);

        event.reject("U2");
        assert_eq!(event.status(), EventStatus::Rejected);
        assert_eq!(event.approvers(), ["U1".to_string()]);
        assert_eq!(event.rejecters(), ["U2".to_string()]);
    }

    #[test]
    fn test_past_deadline_without_responses_times_out() {
        let event = Event::with_id("E1", now().unix_timestamp() - 10);
        assert_eq!(event.status(), EventStatus::Timeout);
    }

    #[test]
    fn test_rejection_wins_regardless_of_order_and_count() {
        let at = now();
        for timeout in [at.unix_timestamp() - 100, at.unix_timestamp() + 100] {
            let mut event = Event::with_id("E1", timeout);
            event.reject("U0");
            for i in 0..5 {
                event.approve(format!("U{i}"));
            }
            assert_eq!(event.status_at(at), EventStatus::Rejected);
        }
    }

    #[test]
    fn test_approval_beats_timeout() {
        let mut event = Event::with_id("E1", now().unix_timestamp() - 3600);
        event.approve("U1");
        assert_eq!(event.status(), EventStatus::Approved);
    }

    #[test]
    fn test_deadline_is_strict() {
        let event = Event::with_id("E1", 1_700_000_000);
        let deadline = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(event.status_at(deadline), EventStatus::InProgress);
        assert_eq!(
            event.status_at(deadline + Duration::milliseconds(1)),
            EventStatus::Timeout
        );
        assert_eq!(
            event.status_at(deadline - Duration::seconds(1)),
            EventStatus::InProgress
        );
    }

    #[test]
    fn test_duplicate_responses_are_kept() {
        let mut event = Event::with_id("E1", now().unix_timestamp() + 60);
        event.approve("U1");
        event.approve("U1");
        assert_eq!(event.approvers().len(), 2);
        assert_eq!(event.status(), EventStatus::Approved);
    }

    #[test]
    fn test_refresh_after_load_uses_read_time() {
        // Stored while still open, read after the deadline passed.
        let json = br#"{"id":"E1","timeout_epoch":1000,"approvers":[],"rejecters":null,"status":"in-progress"}"#;
        let event = Event::from_bytes("E1", json).unwrap();
        assert_eq!(event.status(), EventStatus::Timeout);
        assert!(event.rejecters().is_empty());
    }

    #[test]
    fn test_decode_failure_names_the_key() {
        let err = Event::from_bytes("E1", b"not json").unwrap_err();
        assert!(matches!(err, StoreError::Decode { ref key, .. } if key == "E1"));
    }

    #[test]
    fn test_stored_representation() {
        let mut event = Event::with_id("E1", 42);
        event.approve("U1");
        let value: serde_json::Value = serde_json::from_slice(&event.to_bytes().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "E1",
                "timeout_epoch": 42,
                "approvers": ["U1"],
                "rejecters": [],
                "status": "approved",
            })
        );
    }

    #[test]
    fn test_entropy_failure_aborts_creation() {
        assert!(Event::new(0, &FailingEntropy).is_err());
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let processor = StoreProcessor::new(Arc::new(MemoryKeyValueStore::new()));
        let mut event = Event::with_id("E1", now().unix_timestamp() + 60);
        event.reject("U9");

        processor
            .process(PutEvent {
                event: event.clone(),
            })
            .await
            .unwrap();

        let loaded = processor
            .process(GetEventById { id: "E1".into() })
            .await
            .unwrap();
        assert_eq!(loaded, Some(event));

        let missing = processor
            .process(GetEventById { id: "nope".into() })
            .await
            .unwrap();
        assert_eq!(missing, None);
    }
}
