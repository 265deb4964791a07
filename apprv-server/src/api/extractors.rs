//! Custom Axum extractors for request authentication.
//!
//! Provides `SlackForm<T>`, which checks the Slack request signature over the
//! raw body (when a signing secret is configured) and then decodes the body
//! as an `application/x-www-form-urlencoded` form.
//!
//! All cryptographic operations are delegated to [`apprv_sdk::signature`].

use axum::{
    Form,
    body::Body,
    extract::{FromRequest, Request, rejection::FormRejection},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use apprv_sdk::signature::{self, SIGNATURE_HEADER, SignatureError, TIMESTAMP_HEADER};
use serde::de::DeserializeOwned;

use crate::state::AppState;

/// Largest callback body accepted.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// An Axum extractor that verifies the Slack signature headers and
/// deserializes the form-encoded request body.
///
/// # Header format
///
/// ```text
/// X-Slack-Request-Timestamp: {unix_timestamp}
/// X-Slack-Signature:         v0={hex_signature}
/// ```
pub struct SlackForm<T>(pub T);

/// Errors that can occur during signed-form extraction.
#[derive(Debug, thiserror::Error)]
pub enum SlackFormError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("invalid {0} header")]
    InvalidHeader(&'static str),
    #[error("failed to read request body")]
    BodyReadError,
    #[error("signature verification failed: {0}")]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    Form(#[from] FormRejection),
}

impl IntoResponse for SlackFormError {
    fn into_response(self) -> Response {
        match self {
            SlackFormError::MissingHeader(name) => {
                (StatusCode::UNAUTHORIZED, format!("missing {name} header")).into_response()
            }
            SlackFormError::InvalidHeader(name) => {
                (StatusCode::BAD_REQUEST, format!("invalid {name} header")).into_response()
            }
            SlackFormError::BodyReadError => {
                (StatusCode::BAD_REQUEST, "failed to read request body").into_response()
            }
            SlackFormError::Signature(e) => {
                tracing::warn!(error = %e, "Rejected callback with bad signature");
                let status = match e {
                    SignatureError::InvalidFormat | SignatureError::InvalidHex => {
                        StatusCode::BAD_REQUEST
                    }
                    SignatureError::SignatureMismatch | SignatureError::Expired => {
                        StatusCode::UNAUTHORIZED
                    }
                };
                (status, "signature verification failed").into_response()
            }
            SlackFormError::Form(rejection) => rejection.into_response(),
        }
    }
}

fn header<'a>(parts: &'a Parts, name: &'static str) -> Result<&'a str, SlackFormError> {
    parts
        .headers
        .get(name)
        .ok_or(SlackFormError::MissingHeader(name))?
        .to_str()
        .map_err(|_| SlackFormError::InvalidHeader(name))
}

impl<T: DeserializeOwned + Send> FromRequest<AppState> for SlackForm<T> {
    type Rejection = SlackFormError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let signing_secret = state.slack.read().await.signing_secret();

        let (parts, body) = req.into_parts();
        let body_bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|_| SlackFormError::BodyReadError)?;

        if let Some(secret) = signing_secret {
            let timestamp = header(&parts, TIMESTAMP_HEADER)?;
            let signature_header = header(&parts, SIGNATURE_HEADER)?;
            signature::verify_request(timestamp, signature_header, &body_bytes, &secret)?;
        }

        let req = Request::from_parts(parts, Body::from(body_bytes));
        let Form(value) = Form::<T>::from_request(req, state).await?;

        Ok(SlackForm(value))
    }
}
