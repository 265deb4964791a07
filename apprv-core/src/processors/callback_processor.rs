//! CallbackProcessor.
//!
//! Applies one validated callback to its event:
//! 1. fetch the event named by the first action's `block_id`
//! 2. record the user as approver (`"1"`) or rejecter (`"0"`)
//! 3. write the event back under the same id
//! 4. post the formatted result to the callback's `response_url`
//!
//! Any failure ends processing at that step. Nothing is retried and the
//! Slack caller is not contacted again; the error is returned to the
//! dispatcher, which logs it.
//!
//! Steps 1 to 3 are a plain read-modify-write. Two callbacks for the same
//! event processed at the same time can both read the same state, and the
//! later write drops the earlier response.

use crate::entities::{Event, GetEventById, PutEvent};
use crate::framework::StoreProcessor;
use crate::processors::formatter::ResultFormatter;
use crate::processors::notifier::{Notifier, NotifyError};
use crate::store::StoreError;
use apprv_sdk::objects::CallbackMessage;
use kanau::processor::Processor;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Terminal failures of a processing run.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The callback carries no action to apply.
    #[error("callback has no actions")]
    NoAction,

    /// No event is stored under the callback's `block_id`.
    #[error("event not found: {0}")]
    EventNotFound(String),

    /// The event could not be read or decoded.
    #[error("failed to fetch event {event_id}: {source}")]
    Fetch {
        event_id: String,
        #[source]
        source: StoreError,
    },

    /// The updated event could not be written back.
    #[error("failed to store event {event_id}: {source}")]
    Store {
        event_id: String,
        #[source]
        source: StoreError,
    },

    /// The event was updated but the result could not be delivered.
    #[error("failed to post result for event {event_id}: {source}")]
    Notify {
        event_id: String,
        #[source]
        source: NotifyError,
    },
}

impl ProcessError {
    /// True if the stored event was updated before the failure.
    pub fn is_after_store(&self) -> bool {
        matches!(self, ProcessError::Notify { .. })
    }
}

/// Fetch, mutate, store, notify.
pub struct CallbackProcessor {
    store: StoreProcessor,
    notifier: Arc<dyn Notifier>,
    formatter: Arc<dyn ResultFormatter>,
}

impl CallbackProcessor {
    /// Create a new CallbackProcessor.
    ///
    /// # Arguments
    ///
    /// * `store` - Store the events live in
    /// * `notifier` - Delivers results to `response_url`
    /// * `formatter` - Builds the result payload
    pub fn new(
        store: StoreProcessor,
        notifier: Arc<dyn Notifier>,
        formatter: Arc<dyn ResultFormatter>,
    ) -> Self {
        Self {
            store,
            notifier,
            formatter,
        }
    }

    /// Process one callback and return the event as stored.
    pub async fn handle(&self, msg: CallbackMessage) -> Result<Event, ProcessError> {
        let event_id = msg.event_id().ok_or(ProcessError::NoAction)?.to_owned();

        let mut event = self
            .store
            .process(GetEventById {
                id: event_id.clone(),
            })
            .await
            .map_err(|source| ProcessError::Fetch {
                event_id: event_id.clone(),
                source,
            })?
            .ok_or_else(|| ProcessError::EventNotFound(event_id.clone()))?;

        let user_id = msg.user_id().to_owned();
        if msg.is_approved() {
            event.approve(user_id);
        } else {
            event.reject(user_id);
        }
        debug!(
            event_id = %event_id,
            user_id = %msg.user_id(),
            status = %event.status(),
            "Applied callback response"
        );

        let event = self
            .store
            .process(PutEvent { event })
            .await
            .map_err(|source| ProcessError::Store {
                event_id: event_id.clone(),
                source,
            })?;

        let payload = self.formatter.format(&msg, &event);
        self.notifier
            .post(&msg.response_url, &payload)
            .await
            .map_err(|source| ProcessError::Notify {
                event_id: event_id.clone(),
                source,
            })?;

        info!(event_id = %event_id, status = %event.status(), "Callback processed");
        Ok(event)
    }
}

impl Processor<CallbackMessage> for CallbackProcessor {
    type Output = Event;
    type Error = ProcessError;

    async fn process(&self, msg: CallbackMessage) -> Result<Event, ProcessError> {
        self.handle(msg).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{LockstepStore, ReadOnlyStore, RecordingNotifier};
    use super::*;
    use crate::processors::formatter::DefaultResultFormatter;
    use crate::store::{KeyValueStore, MemoryKeyValueStore, SharedStore};
    use apprv_sdk::objects::EventStatus;
    use serde_json::json;

    const RESPONSE_URL: &str = "https://hooks.slack.com/actions/T1/1/abc";

    fn callback(event_id: &str, user_id: &str, value: &str) -> CallbackMessage {
        serde_json::from_value(json!({
            "user": {"id": user_id},
            "message": {"blocks": [{"type": "actions"}]},
            "response_url": RESPONSE_URL,
            "actions": [{"block_id": event_id, "value": value}],
        }))
        .unwrap()
    }

    async fn seed(store: &MemoryKeyValueStore, event: &Event) {
        store.set(event.id(), event.to_bytes().unwrap()).await.unwrap();
    }

    async fn load(store: &MemoryKeyValueStore, id: &str) -> Event {
        let bytes = store.get(id).await.unwrap().unwrap();
        Event::from_bytes(id, &bytes).unwrap()
    }

    fn processor(store: SharedStore, notifier: Arc<RecordingNotifier>) -> CallbackProcessor {
        CallbackProcessor::new(
            StoreProcessor::new(store),
            notifier,
            Arc::new(DefaultResultFormatter),
        )
    }

    fn open_event(id: &str) -> Event {
        Event::with_id(id, time::OffsetDateTime::now_utc().unix_timestamp() + 3600)
    }

    #[tokio::test]
    async fn test_approve_is_stored_and_notified() {
        let store = MemoryKeyValueStore::new();
        seed(&store, &open_event("E1")).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let processor = processor(Arc::new(store.clone()), notifier.clone());

        let event = processor.process(callback("E1", "U1", "1")).await.unwrap();
        assert_eq!(event.status(), EventStatus::Approved);

        let stored = load(&store, "E1").await;
        assert_eq!(stored.approvers(), ["U1".to_string()]);
        assert_eq!(stored.status(), EventStatus::Approved);

        let posts = notifier.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, RESPONSE_URL);
        assert!(posts[0].1.text.contains("approved"));
    }

    #[tokio::test]
    async fn test_reject_after_approve_wins() {
        let store = MemoryKeyValueStore::new();
        seed(&store, &open_event("E1")).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let processor = processor(Arc::new(store.clone()), notifier);

        processor.handle(callback("E1", "U1", "1")).await.unwrap();
        let event = processor.handle(callback("E1", "U2", "0")).await.unwrap();

        assert_eq!(event.status(), EventStatus::Rejected);
        let stored = load(&store, "E1").await;
        assert_eq!(stored.approvers(), ["U1".to_string()]);
        assert_eq!(stored.rejecters(), ["U2".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_event_stops_before_notifying() {
        let store = MemoryKeyValueStore::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let processor = processor(Arc::new(store.clone()), notifier.clone());

        let err = processor.handle(callback("E404", "U1", "1")).await.unwrap_err();
        assert!(matches!(err, ProcessError::EventNotFound(ref id) if id == "E404"));
        assert!(notifier.posts().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_undecodable_event_stops_before_notifying() {
        let store = MemoryKeyValueStore::new();
        store.set("E1", b"{\"id\":".to_vec()).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let processor = processor(Arc::new(store.clone()), notifier.clone());

        let err = processor.handle(callback("E1", "U1", "1")).await.unwrap_err();
        assert!(matches!(
            err,
            ProcessError::Fetch {
                source: StoreError::Decode { .. },
                ..
            }
        ));
        assert!(notifier.posts().is_empty());
        assert_eq!(store.get("E1").await.unwrap(), Some(b"{\"id\":".to_vec()));
    }

    #[tokio::test]
    async fn test_store_failure_leaves_record_unchanged() {
        let inner = MemoryKeyValueStore::new();
        seed(&inner, &open_event("E1")).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let processor = processor(Arc::new(ReadOnlyStore(inner.clone())), notifier.clone());

        let err = processor.handle(callback("E1", "U1", "0")).await.unwrap_err();
        assert!(matches!(err, ProcessError::Store { .. }));
        assert!(!err.is_after_store());

        let stored = load(&inner, "E1").await;
        assert!(stored.rejecters().is_empty());
        assert_eq!(stored.status(), EventStatus::InProgress);
        assert!(notifier.posts().is_empty());
    }

    #[tokio::test]
    async fn test_notify_failure_keeps_stored_update() {
        let store = MemoryKeyValueStore::new();
        seed(&store, &open_event("E1")).await;
        let notifier = Arc::new(RecordingNotifier::failing(500));
        let processor = processor(Arc::new(store.clone()), notifier.clone());

        let err = processor.handle(callback("E1", "U1", "1")).await.unwrap_err();
        assert!(err.is_after_store());
        assert_eq!(notifier.posts().len(), 1);
        assert_eq!(load(&store, "E1").await.approvers(), ["U1".to_string()]);
    }

    #[tokio::test]
    async fn test_no_action_is_rejected() {
        let notifier = Arc::new(RecordingNotifier::default());
        let processor = processor(Arc::new(MemoryKeyValueStore::new()), notifier);

        let err = processor
            .handle(CallbackMessage::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::NoAction));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_responses_lose_one_update() {
        let inner = MemoryKeyValueStore::new();
        seed(&inner, &open_event("E1")).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let processor = Arc::new(processor(
            Arc::new(LockstepStore::new(inner.clone(), 2)),
            notifier.clone(),
        ));

        // Both runs read the untouched event before either writes.
        let approving = tokio::spawn({
            let processor = processor.clone();
            async move { processor.handle(callback("E1", "U1", "1")).await }
        });
        let rejecting = tokio::spawn({
            let processor = processor.clone();
            async move { processor.handle(callback("E1", "U2", "0")).await }
        });

        let approved = approving.await.unwrap().unwrap();
        let rejected = rejecting.await.unwrap().unwrap();

        // Each run saw only its own response.
        assert_eq!(approved.approvers(), ["U1".to_string()]);
        assert!(approved.rejecters().is_empty());
        assert_eq!(rejected.rejecters(), ["U2".to_string()]);
        assert!(rejected.approvers().is_empty());

        // Last write wins: exactly one of the two responses survived.
        let stored = load(&inner, "E1").await;
        assert_eq!(stored.approvers().len() + stored.rejecters().len(), 1);
        assert!(stored == approved || stored == rejected);
        assert_eq!(notifier.posts().len(), 2);
    }
}
