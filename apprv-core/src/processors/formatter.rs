use crate::entities::Event;
use apprv_sdk::objects::{CallbackMessage, CallbackResultPayload, EventStatus};

/// Builds the message posted back to a callback's `response_url`.
pub trait ResultFormatter: Send + Sync {
    fn format(&self, msg: &CallbackMessage, event: &Event) -> CallbackResultPayload;
}

/// Replaces the interactive message with a one-line summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResultFormatter;

impl ResultFormatter for DefaultResultFormatter {
    fn format(&self, msg: &CallbackMessage, event: &Event) -> CallbackResultPayload {
        let verb = if msg.is_approved() {
            "approved"
        } else {
            "rejected"
        };
        let outcome = match event.status() {
            EventStatus::Approved => "The request is approved.",
            EventStatus::Rejected => "The request is rejected.",
            EventStatus::Timeout => "The request has timed out.",
            EventStatus::InProgress => "The request is still waiting for a response.",
        };

        CallbackResultPayload {
            replace_original: true,
            text: format!("<@{}> {verb} this request. {outcome}", msg.user_id()),
        }
    }
}
