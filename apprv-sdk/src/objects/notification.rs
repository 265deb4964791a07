//! Result payload posted back to a callback's `response_url`.

use serde::{Deserialize, Serialize};

/// Message sent to the `response_url` after a callback has been applied.
///
/// Slack replaces the interactive message the reviewer clicked on with this
/// one, so the buttons disappear once a response has been recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackResultPayload {
    pub replace_original: bool,
    pub text: String,
}
