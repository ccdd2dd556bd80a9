//! Client for the hosted backend's REST surface.
//!
//! Endpoints used:
//! - tables:  `/rest/v1/{table}` (PostgREST filters, `Prefer` headers)
//! - RPCs:    `/rest/v1/rpc/{name}`
//! - storage: `/storage/v1/object/list/{bucket}`, `/storage/v1/object/{bucket}`
//! - auth:    `/auth/v1/user`
//!
//! Table, RPC and storage calls authenticate with the service key.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hyper::{Method, Uri};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::backend::{Backend, BackendError, StoredObject};
use super::query::Query;
use crate::config::Backend as BackendConfig;
use crate::http::client::request::SendError;
use crate::http::client::{create_client, send, HyperClient, Reply};
use crate::model::AuthUser;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Page size of storage listings.
pub const LIST_PAGE: usize = 1000;
pub const USER_ROLES_TABLE: &str = "user_roles";
pub const ADMIN_ROLE: &str = "admin";

const RETURN_REPRESENTATION: &str = "return=representation";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

pub struct RestBackend {
    client: HyperClient,
    base_url: String,
    anon_key: String,
    service_key: String,
    timeout: Duration,
}

/// One entry of a storage listing; folders carry no id.
#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SessionUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl RestBackend {
    pub fn new(cfg: &BackendConfig) -> Result<Self> {
        let base_url = cfg
            .url
            .as_deref()
            .ok_or_else(|| anyhow!("backend.url is required in rest mode"))?
            .trim_end_matches('/')
            .to_string();
        let service_key = cfg
            .service_key
            .clone()
            .ok_or_else(|| anyhow!("backend.service_key is required in rest mode"))?;
        let anon_key = cfg.anon_key.clone().unwrap_or_else(|| service_key.clone());

        Ok(Self {
            client: create_client()?,
            base_url,
            anon_key,
            service_key,
            timeout: cfg.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }

    fn uri(&self, path: &str, query: &str) -> Result<Uri, BackendError> {
        let raw = if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        };
        raw.parse::<Uri>()
            .map_err(|e| BackendError::InvalidRequest(format!("bad uri {}: {}", raw, e)))
    }

    fn service_headers(&self, prefer: Option<&str>) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("apikey", self.service_key.clone()),
            ("authorization", format!("Bearer {}", self.service_key)),
            ("content-type", "application/json".to_string()),
            ("accept", "application/json".to_string()),
        ];
        if let Some(prefer) = prefer {
            headers.push(("prefer", prefer.to_string()));
        }
        headers
    }

    async fn call(
        &self,
        op: &'static str,
        method: Method,
        uri: Uri,
        headers: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Reply, BackendError> {
        let body = body
            .map(|v| serde_json::to_vec(&v).map(Bytes::from))
            .transpose()?;

        let reply = send(&self.client, method, uri, headers, body, self.timeout)
            .await
            .map_err(|e| {
                crate::metrics::inc_backend_errors(op);
                transport_error(e)
            })?;

        if reply.is_success() {
            debug!(component = "backend", op, status = reply.status, "backend call ok");
            return Ok(reply);
        }

        crate::metrics::inc_backend_errors(op);
        warn!(
            component = "backend",
            op,
            status = reply.status,
            body = %reply.body_snippet(),
            "backend call failed"
        );
        Err(status_error(&reply))
    }

    async fn table_call(
        &self,
        op: &'static str,
        method: Method,
        table: &str,
        query: String,
        prefer: Option<&str>,
        body: Option<Value>,
    ) -> Result<Vec<Value>, BackendError> {
        let uri = self.uri(&format!("/rest/v1/{}", table), &query)?;
        let reply = self
            .call(op, method, uri, &self.service_headers(prefer), body)
            .await?;
        decode_rows(&reply.body)
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        offset: usize,
    ) -> Result<Vec<ListedObject>, BackendError> {
        let uri = self.uri(&format!("/storage/v1/object/list/{}", bucket), "")?;
        let body = json!({
            "prefix": prefix,
            "limit": LIST_PAGE,
            "offset": offset,
            "sortBy": {"column": "name", "order": "asc"},
        });
        let reply = self
            .call("storage_list", Method::POST, uri, &self.service_headers(None), Some(body))
            .await?;
        Ok(serde_json::from_slice(&reply.body)?)
    }

    async fn is_admin(&self, user_id: &str) -> Result<bool, BackendError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .eq("role", ADMIN_ROLE)
            .limit(1);
        let rows = self.select(USER_ROLES_TABLE, &query).await?;
        Ok(!rows.is_empty())
    }
}

fn transport_error(e: SendError) -> BackendError {
    match e {
        SendError::Build(err) => BackendError::InvalidRequest(err.to_string()),
        other => BackendError::Transport(other.to_string()),
    }
}

/// Maps a failed response onto [`BackendError`], preferring the backend's own message.
fn status_error(reply: &Reply) -> BackendError {
    let message = serde_json::from_slice::<Value>(&reply.body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| reply.body_snippet());

    match reply.status {
        404 => BackendError::NotFound(message),
        409 => BackendError::Conflict(message),
        401 | 403 => BackendError::Unauthorized,
        s if s >= 500 => BackendError::Unavailable { status: s, message },
        s => BackendError::Rejected { status: s, message },
    }
}

/// Responses are arrays of rows; some endpoints answer a bare object or nothing.
fn decode_rows(body: &[u8]) -> Result<Vec<Value>, BackendError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    match serde_json::from_slice::<Value>(body)? {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        other => Ok(vec![other]),
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

fn first_row(rows: Vec<Value>, table: &str) -> Result<Value, BackendError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound(format!("{} returned no row", table)))
}

#[async_trait]
impl Backend for RestBackend {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, BackendError> {
        let mut qs = String::from("select=*");
        let rendered = query.to_query_string();
        if !rendered.is_empty() {
            qs.push('&');
            qs.push_str(&rendered);
        }
        self.table_call("select", Method::GET, table, qs, None, None)
            .await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError> {
        let rows = self
            .table_call(
                "insert",
                Method::POST,
                table,
                String::new(),
                Some(RETURN_REPRESENTATION),
                Some(row),
            )
            .await?;
        first_row(rows, table)
    }

    async fn upsert(
        &self,
        table: &str,
        row: Value,
        on_conflict: &[&str],
    ) -> Result<Value, BackendError> {
        let qs = if on_conflict.is_empty() {
            String::new()
        } else {
            format!("on_conflict={}", urlencoding::encode(&on_conflict.join(",")))
        };
        let rows = self
            .table_call(
                "upsert",
                Method::POST,
                table,
                qs,
                Some(MERGE_DUPLICATES),
                Some(row),
            )
            .await?;
        first_row(rows, table)
    }

    async fn update(
        &self,
        table: &str,
        query: &Query,
        patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        if query.filters.is_empty() {
            return Err(BackendError::InvalidRequest(
                "refusing to update without filters".to_string(),
            ));
        }
        self.table_call(
            "update",
            Method::PATCH,
            table,
            query.to_query_string(),
            Some(RETURN_REPRESENTATION),
            Some(patch),
        )
        .await
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<u64, BackendError> {
        if query.filters.is_empty() {
            return Err(BackendError::InvalidRequest(
                "refusing to delete without filters".to_string(),
            ));
        }
        let rows = self
            .table_call(
                "delete",
                Method::DELETE,
                table,
                query.to_query_string(),
                Some(RETURN_REPRESENTATION),
                None,
            )
            .await?;
        Ok(rows.len() as u64)
    }

    async fn rpc(&self, name: &str, params: Value) -> Result<Value, BackendError> {
        let uri = self.uri(&format!("/rest/v1/rpc/{}", name), "")?;
        let reply = self
            .call("rpc", Method::POST, uri, &self.service_headers(None), Some(params))
            .await?;
        if reply.body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&reply.body)?)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<StoredObject>, BackendError> {
        let mut out = Vec::new();
        let mut folders = vec![prefix.trim_matches('/').to_string()];

        while let Some(folder) = folders.pop() {
            let mut offset = 0;
            loop {
                let page = self.list_page(bucket, &folder, offset).await?;
                let fetched = page.len();
                for item in page {
                    let path = join_path(&folder, &item.name);
                    if item.id.is_none() {
                        folders.push(path);
                        continue;
                    }
                    let size = item
                        .metadata
                        .as_ref()
                        .and_then(|m| m.get("size"))
                        .and_then(Value::as_u64);
                    out.push(StoredObject {
                        bucket: bucket.to_string(),
                        path,
                        size,
                        created_at: item.created_at,
                    });
                }
                if fetched < LIST_PAGE {
                    break;
                }
                offset += fetched;
            }
        }

        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    async fn remove_objects(&self, bucket: &str, paths: &[String]) -> Result<u64, BackendError> {
        if paths.is_empty() {
            return Ok(0);
        }
        let uri = self.uri(&format!("/storage/v1/object/{}", bucket), "")?;
        let reply = self
            .call(
                "storage_remove",
                Method::DELETE,
                uri,
                &self.service_headers(None),
                Some(json!({ "prefixes": paths })),
            )
            .await?;
        Ok(decode_rows(&reply.body)?.len() as u64)
    }

    async fn auth_user(&self, token: &str) -> Result<Option<AuthUser>, BackendError> {
        let uri = self.uri("/auth/v1/user", "")?;
        let headers = [
            ("apikey", self.anon_key.clone()),
            ("authorization", format!("Bearer {}", token)),
            ("accept", "application/json".to_string()),
        ];
        let user: SessionUser = match self.call("auth_user", Method::GET, uri, &headers, None).await {
            Ok(reply) => serde_json::from_slice(&reply.body)?,
            Err(BackendError::Unauthorized) | Err(BackendError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let is_admin = self.is_admin(&user.id).await?;
        Ok(Some(AuthUser {
            id: user.id,
            email: user.email,
            is_admin,
        }))
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let uri = self.uri("/rest/v1/", "")?;
        let headers = self.service_headers(None);
        match send(&self.client, Method::GET, uri, &headers, None, self.timeout).await {
            Ok(reply) if reply.status < 500 => Ok(()),
            Ok(reply) => Err(status_error(&reply)),
            Err(e) => Err(transport_error(e)),
        }
    }
}
