use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use apprv_core::entities::{Event, GetEventById, PutEvent};
use apprv_core::id::EntropyError;
use apprv_core::store::StoreError;
use apprv_sdk::objects::{CreateEventRequest, EventResponse};
use kanau::processor::Processor;

use super::error_response;
use crate::state::AppState;

/// `POST /events` - create a new approval event.
///
/// Generates an identifier, stores the event and returns it with status
/// `in-progress` (or `timeout` if the deadline has already passed).
pub(super) async fn create_event(
    State(state): State<AppState>,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse, EventApiError> {
    let Json(request) = body.map_err(EventApiError::InvalidRequest)?;

    let event = Event::new(request.timeout_epoch, state.entropy.as_ref())
        .map_err(EventApiError::Entropy)?;

    let event = state
        .store_processor()
        .process(PutEvent { event })
        .await
        .map_err(EventApiError::Store)?;

    tracing::info!(
        event_id = %event.id(),
        timeout_epoch = event.timeout_epoch(),
        "Event created"
    );

    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

/// `GET /events/{id}` - fetch an event.
///
/// The status is recomputed at read time, so an unanswered event reads as
/// `timeout` once its deadline has passed.
pub(super) async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, EventApiError> {
    let event = state
        .store_processor()
        .process(GetEventById { id: id.clone() })
        .await
        .map_err(EventApiError::Store)?
        .ok_or(EventApiError::NotFound(id))?;

    Ok(Json(EventResponse::from(event)))
}

/// Errors that can occur in event API handlers.
#[derive(Debug)]
pub(super) enum EventApiError {
    /// The request body was not a valid `CreateEventRequest`.
    InvalidRequest(JsonRejection),
    /// No random bytes for the identifier.
    Entropy(EntropyError),
    /// The store failed or held an undecodable record.
    Store(StoreError),
    /// No event under the requested id.
    NotFound(String),
}

impl IntoResponse for EventApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            EventApiError::InvalidRequest(rejection) => {
                tracing::debug!(error = %rejection, "Rejected event creation request");
                error_response(
                    StatusCode::BAD_REQUEST,
                    "Invalid request to create an event",
                )
            }
            EventApiError::Entropy(e) => {
                tracing::error!(error = %e, "Failed to generate event id");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            EventApiError::Store(e) => {
                tracing::error!(error = %e, "Event store error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            EventApiError::NotFound(id) => {
                error_response(StatusCode::NOT_FOUND, format!("event not found: {id}"))
            }
        }
    }
}
