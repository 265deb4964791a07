//! Event API client (caller backend → apprv server).

use reqwest::Client;
use url::Url;

use super::ClientError;
use crate::objects::{CreateEventRequest, EventResponse};

/// Typed HTTP client for creating and polling approval events.
#[derive(Debug, Clone)]
pub struct EventClient {
    http: Client,
    base_url: Url,
}

impl EventClient {
    /// Create a new `EventClient` rooted at `base_url`
    /// (e.g. `https://approvals.example.com`).
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /events` – create an event that times out at `timeout_epoch`.
    pub async fn create_event(&self, timeout_epoch: i64) -> Result<EventResponse, ClientError> {
        let url = self.base_url.join("/events")?;

        let resp = self
            .http
            .post(url)
            .json(&CreateEventRequest { timeout_epoch })
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /events/{id}` – fetch an event with its current status.
    pub async fn get_event(&self, id: &str) -> Result<EventResponse, ClientError> {
        let mut url = self.base_url.join("/events/")?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(id);

        let resp = self.http.get(url).send().await?;

        parse_response(resp).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
