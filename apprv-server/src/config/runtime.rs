//! Validated runtime configuration.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub use super::file::StoreBackend;

/// Server configuration with runtime values.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Store pool settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
}

/// Callback worker settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub queue_capacity: usize,
}

/// Slack settings. Reloaded on SIGHUP.
#[derive(Clone, Default)]
pub struct SlackConfig {
    signing_secret: Option<Arc<[u8]>>,
}

impl SlackConfig {
    pub fn new(signing_secret: Option<String>) -> Self {
        Self {
            signing_secret: signing_secret.map(|secret| Arc::from(secret.into_bytes())),
        }
    }

    /// The signing secret, if callback signatures are enforced.
    pub fn signing_secret(&self) -> Option<Arc<[u8]>> {
        self.signing_secret.clone()
    }
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
