//! Application state shared across all request handlers.

use crate::config::runtime::SlackConfig;
use apprv_core::framework::StoreProcessor;
use apprv_core::id::EntropySource;
use apprv_core::queue::CallbackSender;
use apprv_core::store::SharedStore;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Event store, constructed once at startup.
    pub store: SharedStore,
    /// Randomness for event identifiers.
    pub entropy: Arc<dyn EntropySource>,
    /// Queue feeding the callback dispatcher.
    pub callbacks: CallbackSender,
    /// Slack configuration (can be reloaded via SIGHUP).
    pub slack: Arc<RwLock<SlackConfig>>,
}

impl AppState {
    pub fn new(
        store: SharedStore,
        entropy: Arc<dyn EntropySource>,
        callbacks: CallbackSender,
        slack: SlackConfig,
    ) -> Self {
        Self {
            store,
            entropy,
            callbacks,
            slack: Arc::new(RwLock::new(slack)),
        }
    }

    /// A processor for store-backed requests.
    pub fn store_processor(&self) -> StoreProcessor {
        StoreProcessor::new(self.store.clone())
    }

    /// Replace the Slack configuration (used during SIGHUP reload).
    pub async fn update_slack(&self, new_config: SlackConfig) {
        let mut slack = self.slack.write().await;
        *slack = new_config;
    }
}
