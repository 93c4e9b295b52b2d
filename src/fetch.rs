//! ACL fetch collaborator contract
//!
//! The engine consumes a fetch operation keyed by `(mountpoint, username)`;
//! the store wildcards the client id, so every client connecting with that
//! mountpoint/username pair shares one document. The store integration owns
//! its own timeout and retry policy; the engine performs exactly one fetch
//! per check and fails closed on any error.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

/// Fetch failure modes.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// No record stored for this `(mountpoint, username)`.
    #[error("no ACL record for this identity")]
    NotFound,

    /// The store could not be reached or timed out.
    #[error("ACL store unavailable: {0}")]
    Unavailable(String),
}

/// External ACL store contract.
///
/// Returns the raw JSON document; schema validation is the engine's job so
/// that a malformed record is distinguishable from a missing one.
#[async_trait]
pub trait AclFetcher: Send + Sync {
    async fn fetch(&self, mountpoint: &str, username: &str) -> Result<Value, FetchError>;
}

/// In-memory fetcher for tests and embedded setups.
#[derive(Debug, Default)]
pub struct MemoryAclFetcher {
    records: RwLock<HashMap<(String, String), Value>>,
}

impl MemoryAclFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document under `(mountpoint, username)`, replacing any prior one.
    pub fn put(&self, mountpoint: &str, username: &str, document: Value) {
        self.records
            .write()
            .insert((mountpoint.to_string(), username.to_string()), document);
    }

    /// Remove the document for `(mountpoint, username)`.
    pub fn remove(&self, mountpoint: &str, username: &str) {
        self.records
            .write()
            .remove(&(mountpoint.to_string(), username.to_string()));
    }
}

#[async_trait]
impl AclFetcher for MemoryAclFetcher {
    async fn fetch(&self, mountpoint: &str, username: &str) -> Result<Value, FetchError> {
        self.records
            .read()
            .get(&(mountpoint.to_string(), username.to_string()))
            .cloned()
            .ok_or(FetchError::NotFound)
    }
}
