//! HTTP API.
//!
//! # Endpoints
//!
//! - `POST /events`      – create an approval event
//! - `GET  /events/{id}` – fetch an event with its current status
//! - `POST /callback`    – Slack interactive-action callback

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use apprv_sdk::objects::ErrorResponse;

use crate::state::AppState;

mod callback;
mod events;
pub mod extractors;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", post(events::create_event))
        .route("/events/{id}", get(events::get_event))
        .route("/callback", post(callback::receive_callback))
}

/// A `{"error": ...}` JSON response.
fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}
