use axum::{extract::State, http::StatusCode, response::IntoResponse};
use apprv_sdk::objects::{CallbackMessage, ValidationError};
use serde::Deserialize;

use super::error_response;
use crate::api::extractors::SlackForm;
use crate::state::AppState;

/// Form body Slack posts to the callback endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct CallbackForm {
    #[serde(default)]
    payload: String,
}

/// `POST /callback` - receive an interactive-action callback.
///
/// The payload is validated here and then queued; processing happens in
/// the background. A valid callback is acknowledged with an empty `200`
/// whatever the processing outcome turns out to be.
pub(super) async fn receive_callback(
    State(state): State<AppState>,
    SlackForm(form): SlackForm<CallbackForm>,
) -> Result<impl IntoResponse, CallbackApiError> {
    let payload = form.payload;
    tracing::debug!(payload = %payload, "Received callback");

    let msg: CallbackMessage = serde_json::from_str(&payload)
        .map_err(|e| CallbackApiError::NotJson { payload: payload.clone(), source: e })?;

    msg.validate().map_err(|reason| CallbackApiError::Invalid {
        reason,
        payload: payload.clone(),
    })?;

    let event_id = msg.event_id().unwrap_or_default().to_owned();
    state
        .callbacks
        .send(msg)
        .await
        .map_err(|_| CallbackApiError::QueueClosed)?;

    tracing::debug!(event_id = %event_id, "Callback queued");
    Ok((StatusCode::OK, ""))
}

/// Errors that can occur in the callback handler.
#[derive(Debug)]
pub(super) enum CallbackApiError {
    /// The `payload` field is not a JSON callback document.
    NotJson {
        payload: String,
        source: serde_json::Error,
    },
    /// The payload failed structural validation.
    Invalid {
        reason: ValidationError,
        payload: String,
    },
    /// The dispatcher is gone (shutting down).
    QueueClosed,
}

impl IntoResponse for CallbackApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            CallbackApiError::NotJson { payload, source } => {
                tracing::debug!(error = %source, "Callback payload is not JSON");
                error_response(
                    StatusCode::BAD_REQUEST,
                    format!("payload is not JSON: {payload}"),
                )
            }
            CallbackApiError::Invalid { reason, payload } => {
                tracing::info!(reason = %reason, "Rejected invalid callback");
                error_response(StatusCode::BAD_REQUEST, format!("{reason}: {payload}"))
            }
            CallbackApiError::QueueClosed => {
                tracing::error!("Callback queue closed");
                error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "callback processing is shutting down",
                )
            }
        }
    }
}
