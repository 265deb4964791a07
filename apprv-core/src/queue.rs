//! Callback work queue.
//!
//! The HTTP handler validates a callback, pushes it here and acknowledges the
//! caller straight away. The [`CallbackDispatcher`](crate::processors::CallbackDispatcher)
//! drains the queue.

use apprv_sdk::objects::CallbackMessage;
use tokio::sync::mpsc;

/// Default buffer size for the callback queue.
///
/// Enough to absorb bursts of button clicks while keeping memory bounded.
/// When full, senders wait.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for validated callbacks.
pub type CallbackSender = mpsc::Sender<CallbackMessage>;
/// Receiver handle for validated callbacks.
pub type CallbackReceiver = mpsc::Receiver<CallbackMessage>;

/// Create a callback queue with [`DEFAULT_CHANNEL_BUFFER`] slots.
pub fn callback_channel() -> (CallbackSender, CallbackReceiver) {
    callback_channel_with_capacity(DEFAULT_CHANNEL_BUFFER)
}

/// Create a callback queue with `capacity` slots (at least one).
pub fn callback_channel_with_capacity(capacity: usize) -> (CallbackSender, CallbackReceiver) {
    mpsc::channel(capacity.max(1))
}
