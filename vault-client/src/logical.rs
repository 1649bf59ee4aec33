//! Logical API trait.
//!
//! Every adapter talks to Vault through this trait, so tests can swap the
//! HTTP client for an in-memory store.

use crate::{error::VaultResult, secrets::Secret};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Read/write/delete/list over slash-separated logical paths.
#[async_trait]
pub trait Logical: Send + Sync {
    /// Read a path. An absent object yields `Ok(None)`.
    async fn read(&self, path: &str) -> VaultResult<Option<Secret>>;

    /// Read a path with query parameters (e.g. `version` for KV v2).
    async fn read_with_query(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> VaultResult<Option<Secret>>;

    /// Write a JSON object to a path. Responses without a body yield `Ok(None)`.
    async fn write(&self, path: &str, data: Map<String, Value>) -> VaultResult<Option<Secret>>;

    /// Delete a path. A missing object is reported as [`crate::VaultError::NotFound`].
    async fn delete(&self, path: &str) -> VaultResult<()>;

    /// List the keys below a path. An empty listing yields `Ok(None)`.
    async fn list(&self, path: &str) -> VaultResult<Option<Secret>>;
}
