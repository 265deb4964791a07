//! Callback processing pipeline.
//!
//! - `CallbackDispatcher`: drains the callback queue, one task per message
//! - `CallbackProcessor`: fetch event, apply response, store, notify
//! - `Notifier`: posts the result to the callback's `response_url`
//! - `ResultFormatter`: builds that result from the message and event

pub mod callback_dispatcher;
pub mod callback_processor;
pub mod formatter;
pub mod notifier;

pub use callback_dispatcher::CallbackDispatcher;
pub use callback_processor::{CallbackProcessor, ProcessError};
pub use formatter::{DefaultResultFormatter, ResultFormatter};
pub use notifier::{HttpNotifier, Notifier, NotifyError};
