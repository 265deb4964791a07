pub mod callback;
pub mod event;
pub mod notification;

pub use callback::{
    APPROVE_VALUE, ActionsBlockPresence, CallbackAction, CallbackMessage, CallbackUser,
    REJECT_VALUE, ValidationError,
};
pub use event::{CreateEventRequest, ErrorResponse, EventResponse, EventStatus};
pub use notification::CallbackResultPayload;

use serde::{Deserialize, Deserializer};

/// Deserialize a field that may be `null` on the wire into its default value.
///
/// Records written by older deployments serialize empty lists as `null`, and
/// Slack omits or nulls fields it has nothing to say about.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
