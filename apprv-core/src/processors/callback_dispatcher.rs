//! CallbackDispatcher.
//!
//! Receives validated callbacks from the queue and spawns one independent
//! task per message, so a slow store or notification endpoint never holds
//! up other callbacks. There is no per-event ordering between tasks.
//!
//! On shutdown it stops receiving and waits for in-flight tasks. Callbacks
//! still sitting in the queue at that point have already been acknowledged,
//! so each one is logged as dropped before the queue is released.

use crate::processors::callback_processor::{CallbackProcessor, ProcessError};
use crate::queue::CallbackReceiver;
use apprv_sdk::objects::CallbackMessage;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub struct CallbackDispatcher {
    processor: Arc<CallbackProcessor>,
}

impl CallbackDispatcher {
    pub fn new(processor: Arc<CallbackProcessor>) -> Self {
        Self { processor }
    }

    /// Run until shutdown is signaled or every sender has been dropped.
    ///
    /// Returns the number of queued callbacks that were dropped unprocessed.
    pub async fn run(
        self,
        mut shutdown_rx: watch::Receiver<bool>,
        mut callback_rx: CallbackReceiver,
    ) -> usize {
        info!("CallbackDispatcher started");

        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("CallbackDispatcher received shutdown signal");
                        break;
                    }
                }

                msg = callback_rx.recv() => {
                    let Some(msg) = msg else {
                        info!("Callback channel closed");
                        break;
                    };
                    let processor = Arc::clone(&self.processor);
                    in_flight.spawn(async move { process_logged(&processor, msg).await });
                }

                Some(joined) = in_flight.join_next() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Callback task panicked or was cancelled");
                    }
                }
            }
        }

        let dropped = drop_queued(&mut callback_rx);

        if !in_flight.is_empty() {
            info!(in_flight = in_flight.len(), "Waiting for in-flight callbacks");
        }
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Callback task panicked or was cancelled");
            }
        }

        info!("CallbackDispatcher shutdown complete");
        dropped
    }
}

/// Close the queue and log every callback left in it.
fn drop_queued(callback_rx: &mut CallbackReceiver) -> usize {
    callback_rx.close();

    let mut dropped = 0;
    while let Ok(msg) = callback_rx.try_recv() {
        dropped += 1;
        error!(
            event_id = %msg.event_id().unwrap_or_default(),
            user_id = %msg.user_id(),
            "Dropping acknowledged callback, dispatcher is shutting down"
        );
    }

    if dropped > 0 {
        warn!(dropped, "Callbacks left unprocessed at shutdown");
    }
    dropped
}

/// Run one callback to completion, logging a terminal failure.
async fn process_logged(processor: &CallbackProcessor, msg: CallbackMessage) {
    let event_id = msg.event_id().unwrap_or_default().to_owned();
    debug!(event_id = %event_id, user_id = %msg.user_id(), "Processing callback");

    match processor.handle(msg).await {
        Ok(_) => {}
        Err(e @ ProcessError::Notify { .. }) => {
            warn!(event_id = %event_id, error = %e, "Failed to post callback result");
        }
        Err(e) => {
            error!(event_id = %event_id, error = %e, "Failed to process callback");
        }
    }
}
