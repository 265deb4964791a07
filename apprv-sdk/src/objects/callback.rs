//! Interactive-action callback payloads.
//!
//! Slack posts these to the callback endpoint as a form field named
//! `payload`. Only the parts the approval workflow reads are typed; the
//! echoed `message` stays an open JSON map and is checked structurally by
//! [`CallbackMessage::validate`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::null_as_default;

/// Action value recorded as an approval.
pub const APPROVE_VALUE: &str = "1";
/// Action value recorded as a rejection.
pub const REJECT_VALUE: &str = "0";

/// The user who clicked the button.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackUser {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team_id: String,
}

/// One element of the `actions` array.
///
/// `block_id` carries the target event id and `value` is either
/// [`APPROVE_VALUE`] or [`REJECT_VALUE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackAction {
    #[serde(default, deserialize_with = "null_as_default")]
    pub block_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

/// An interactive-action callback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallbackMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: CallbackUser,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub response_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<CallbackAction>,
}

/// Reasons a callback payload is rejected before any processing happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("actions is empty")]
    EmptyActions,

    #[error("unknown value: {0}")]
    UnknownActionValue(String),

    #[error("message.blocks is not found")]
    MissingBlocks,

    #[error("message.blocks is not an array")]
    BlocksNotArray,

    #[error("a message.blocks element is not a map")]
    BlocksElementNotMap,

    #[error("no actions block found")]
    NoActionsBlock,

    #[error("{0} actions blocks found, expected exactly 1")]
    MultipleActionsBlocks(usize),
}

/// Narrow view over `message.blocks`: how many `"actions"` blocks it holds.
///
/// Scanning the open-ended block list once into this count avoids modelling
/// the full Block Kit schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionsBlockPresence {
    pub count: usize,
}

impl ActionsBlockPresence {
    /// Scan a `blocks` value. Fails if it is not an array of maps.
    pub fn scan(blocks: &Value) -> Result<Self, ValidationError> {
        let Value::Array(elements) = blocks else {
            return Err(ValidationError::BlocksNotArray);
        };

        let mut count = 0;
        for element in elements {
            let Value::Object(block) = element else {
                return Err(ValidationError::BlocksElementNotMap);
            };
            if block.get("type").and_then(Value::as_str) == Some("actions") {
                count += 1;
            }
        }

        Ok(Self { count })
    }

    /// Require exactly one actions block.
    pub fn require_single(self) -> Result<(), ValidationError> {
        match self.count {
            0 => Err(ValidationError::NoActionsBlock),
            1 => Ok(()),
            n => Err(ValidationError::MultipleActionsBlocks(n)),
        }
    }
}

impl CallbackMessage {
    /// Structurally validate the payload.
    ///
    /// Checks run in a fixed order and stop at the first failure. Whether the
    /// referenced event exists is not checked here.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let action = self.actions.first().ok_or(ValidationError::EmptyActions)?;
        if action.value != APPROVE_VALUE && action.value != REJECT_VALUE {
            return Err(ValidationError::UnknownActionValue(action.value.clone()));
        }

        let blocks = self
            .message
            .get("blocks")
            .ok_or(ValidationError::MissingBlocks)?;

        ActionsBlockPresence::scan(blocks)?.require_single()
    }

    /// The action that decides the outcome. Later actions are ignored.
    pub fn first_action(&self) -> Option<&CallbackAction> {
        self.actions.first()
    }

    /// Id of the event this callback responds to.
    pub fn event_id(&self) -> Option<&str> {
        self.first_action().map(|action| action.block_id.as_str())
    }

    pub fn is_approved(&self) -> bool {
        self.first_action()
            .is_some_and(|action| action.value == APPROVE_VALUE)
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}
