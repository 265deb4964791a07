//! Result notification.
//!
//! Posts the result payload to the `response_url` carried by the callback.
//! Delivery is attempted once: failures are reported to the caller, which
//! logs them, and are never retried.

use apprv_sdk::objects::CallbackResultPayload;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during notification delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("notification delivery failed with status {status}: {body}")]
    DeliveryFailed { status: u16, body: String },

    /// Payload serialization error
    #[error("payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `payload` to `url`.
    async fn post(&self, url: &str, payload: &CallbackResultPayload) -> Result<(), NotifyError>;
}

/// Sends notifications as JSON `POST` requests.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    http_client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    pub fn with_http_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

impl Default for HttpNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn post(&self, url: &str, payload: &CallbackResultPayload) -> Result<(), NotifyError> {
        let body = serde_json::to_string(payload)?;

        let response = self
            .http_client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NotifyError::DeliveryFailed {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> CallbackResultPayload {
        CallbackResultPayload {
            replace_original: true,
            text: "<@U1> approved this request. The request is approved.".into(),
        }
    }

    #[tokio::test]
    async fn test_posts_json_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/actions/T1/123"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "replace_original": true,
                "text": "<@U1> approved this request. The request is approved.",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/actions/T1/123", server.uri());
        HttpNotifier::new().post(&url, &payload()).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("expired_url"))
            .expect(1)
            .mount(&server)
            .await;

        let err = HttpNotifier::new()
            .post(&server.uri(), &payload())
            .await
            .unwrap_err();
        match err {
            NotifyError::DeliveryFailed { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "expired_url");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_request_error() {
        let err = HttpNotifier::new()
            .post("not a url", &payload())
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Request(_)));
    }
}
