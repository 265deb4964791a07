//! Keyed byte store holding serialized events.
//!
//! The core only needs `get` and `set` by key. Two backends exist: Postgres
//! for deployments and an in-memory map for development and tests. Neither
//! offers compare-and-swap, so concurrent writers to the same key overwrite
//! each other.

mod memory;
mod postgres;

pub use memory::MemoryKeyValueStore;
pub use postgres::PgKeyValueStore;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a store backend or while (de)serializing its records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A record could not be serialized.
    #[error("failed to encode record {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored record could not be deserialized.
    #[error("failed to decode record {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if there is none.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key`, replacing whatever was there.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;
}

/// A store handle shared by every request handler and background task.
pub type SharedStore = Arc<dyn KeyValueStore>;
