// Backend trait and its error type.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::query::Query;
use crate::model::AuthUser;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("rejected by backend ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("backend unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// An object in a storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub bucket: String,
    /// Full path inside the bucket, e.g. `artists/42/avatar.webp`.
    pub path: String,
    pub size: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Operations the service performs against the hosted backend.
///
/// Rows travel as JSON objects; typed access goes through [`fetch`] and
/// `serde_json::from_value`.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, BackendError>;

    /// Inserts one row and returns it as stored (ids and defaults filled in).
    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError>;

    /// Inserts or merges on the `on_conflict` columns and returns the stored row.
    async fn upsert(
        &self,
        table: &str,
        row: Value,
        on_conflict: &[&str],
    ) -> Result<Value, BackendError>;

    /// Patches every row matching `query` and returns the updated rows.
    async fn update(
        &self,
        table: &str,
        query: &Query,
        patch: Value,
    ) -> Result<Vec<Value>, BackendError>;

    /// Deletes every row matching `query` and returns how many were removed.
    async fn delete(&self, table: &str, query: &Query) -> Result<u64, BackendError>;

    /// Calls a named server-side function.
    async fn rpc(&self, name: &str, params: Value) -> Result<Value, BackendError>;

    /// Lists every object under `prefix`, descending into folders.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<StoredObject>, BackendError>;

    async fn remove_objects(&self, bucket: &str, paths: &[String]) -> Result<u64, BackendError>;

    /// Resolves a session token; `Ok(None)` for unknown or expired sessions.
    async fn auth_user(&self, token: &str) -> Result<Option<AuthUser>, BackendError>;

    /// Cheap reachability check for the liveness probe.
    async fn ping(&self) -> Result<(), BackendError>;
}

/// Selects rows and decodes them into `T`.
pub async fn fetch<T: DeserializeOwned>(
    backend: &dyn Backend,
    table: &str,
    query: &Query,
) -> Result<Vec<T>, BackendError> {
    backend
        .select(table, query)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(BackendError::from))
        .collect()
}

/// Selects at most one row and decodes it into `T`.
pub async fn fetch_one<T: DeserializeOwned>(
    backend: &dyn Backend,
    table: &str,
    query: Query,
) -> Result<Option<T>, BackendError> {
    let mut rows = fetch::<T>(backend, table, &query.limit(1)).await?;
    Ok(rows.pop())
}
