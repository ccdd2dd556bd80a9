//! In-process backend used by tests and by `backend.mode: memory`.
//!
//! Tables are JSON rows keyed by table name; filters are evaluated with
//! [`Query::apply`], so the REST and memory backends share one dialect.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use super::backend::{Backend, BackendError, StoredObject};
use super::query::Query;
use crate::model::social::{ATTENDANCE_TABLE, FOLLOWS_TABLE, REVIEWS_TABLE, SOCIAL_COUNTS_RPC};
use crate::model::AuthUser;

#[derive(Default)]
pub struct MemoryBackend {
    tables: DashMap<String, Vec<Value>>,
    sessions: DashMap<String, AuthUser>,
    /// bucket -> path -> object
    objects: DashMap<String, HashMap<String, StoredObject>>,
}

/// Random 128-bit id rendered as hex.
pub fn new_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bearer token resolving to `user`.
    pub fn add_session(&self, token: impl Into<String>, user: AuthUser) {
        self.sessions.insert(token.into(), user);
    }

    /// Places an object in a bucket.
    pub fn put_object(
        &self,
        bucket: &str,
        path: &str,
        created_at: Option<DateTime<Utc>>,
        size: Option<u64>,
    ) {
        self.objects.entry(bucket.to_string()).or_default().insert(
            path.to_string(),
            StoredObject {
                bucket: bucket.to_string(),
                path: path.to_string(),
                size,
                created_at,
            },
        );
    }

    pub fn has_object(&self, bucket: &str, path: &str) -> bool {
        self.objects
            .get(bucket)
            .map(|b| b.contains_key(path))
            .unwrap_or(false)
    }

    /// Appends rows as-is, filling `id` and `created_at` when absent.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        let mut t = self.tables.entry(table.to_string()).or_default();
        for row in rows {
            t.push(with_defaults(row));
        }
    }

    /// Snapshot of a table's rows in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .get(table)
            .map(|t| t.value().clone())
            .unwrap_or_default()
    }

    fn social_counts(&self, params: &Value) -> Result<Value, BackendError> {
        let entity_type = params
            .get("p_entity_type")
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::InvalidRequest("p_entity_type is required".into()))?;
        let entity_id = params
            .get("p_entity_id")
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::InvalidRequest("p_entity_id is required".into()))?;

        let of_entity = Query::new()
            .eq("entity_type", entity_type)
            .eq("entity_id", entity_id);
        let followers = of_entity.apply(self.rows(FOLLOWS_TABLE)).len();
        let reviews = of_entity.apply(self.rows(REVIEWS_TABLE));
        let ratings: Vec<f64> = reviews
            .iter()
            .filter_map(|r| r.get("rating").and_then(Value::as_f64))
            .collect();
        let average_rating = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        };

        let (going, interested) = if entity_type == "event" {
            let attendance = Query::new()
                .eq("event_id", entity_id)
                .apply(self.rows(ATTENDANCE_TABLE));
            let count = |status: &str| {
                attendance
                    .iter()
                    .filter(|a| a.get("status").and_then(Value::as_str) == Some(status))
                    .count()
            };
            (count("going"), count("interested"))
        } else {
            (0, 0)
        };

        Ok(json!({
            "followers": followers,
            "going": going,
            "interested": interested,
            "reviews": reviews.len(),
            "average_rating": average_rating,
        }))
    }
}

fn as_object(row: Value) -> Result<Map<String, Value>, BackendError> {
    match row {
        Value::Object(map) => Ok(map),
        other => Err(BackendError::InvalidRequest(format!(
            "row must be a JSON object, got {}",
            other
        ))),
    }
}

fn with_defaults(row: Value) -> Value {
    match row {
        Value::Object(mut map) => {
            if map.get("id").map(Value::is_null).unwrap_or(true) {
                map.insert("id".to_string(), Value::String(new_id()));
            }
            if map.get("created_at").map(Value::is_null).unwrap_or(true) {
                map.insert("created_at".to_string(), json!(crate::time::now_utc()));
            }
            Value::Object(map)
        }
        other => other,
    }
}

fn merge(target: &mut Value, patch: &Map<String, Value>) {
    if let Value::Object(map) = target {
        for (k, v) in patch {
            map.insert(k.clone(), v.clone());
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, BackendError> {
        Ok(query.apply(self.rows(table)))
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError> {
        let row = with_defaults(Value::Object(as_object(row)?));
        let mut t = self.tables.entry(table.to_string()).or_default();
        let id = row.get("id").cloned().unwrap_or(Value::Null);
        if t.iter().any(|r| r.get("id") == Some(&id)) {
            return Err(BackendError::Conflict(format!("{}.id already exists", table)));
        }
        t.push(row.clone());
        Ok(row)
    }

    async fn upsert(
        &self,
        table: &str,
        row: Value,
        on_conflict: &[&str],
    ) -> Result<Value, BackendError> {
        let patch = as_object(row)?;
        let key = on_conflict
            .iter()
            .fold(Query::new(), |q, col| {
                q.eq(col, patch.get(*col).cloned().unwrap_or(Value::Null))
            });

        let mut t = self.tables.entry(table.to_string()).or_default();
        if let Some(existing) = t.iter_mut().find(|r| key.matches(r)) {
            merge(existing, &patch);
            return Ok(existing.clone());
        }
        let row = with_defaults(Value::Object(patch));
        t.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        query: &Query,
        patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        let patch = as_object(patch)?;
        let mut t = self.tables.entry(table.to_string()).or_default();
        let mut updated = Vec::new();
        for row in t.iter_mut().filter(|r| query.matches(r)) {
            merge(row, &patch);
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<u64, BackendError> {
        let Some(mut t) = self.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = t.len();
        t.retain(|r| !query.matches(r));
        Ok((before - t.len()) as u64)
    }

    async fn rpc(&self, name: &str, params: Value) -> Result<Value, BackendError> {
        match name {
            SOCIAL_COUNTS_RPC => self.social_counts(&params),
            other => Err(BackendError::NotFound(format!("function {}", other))),
        }
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<StoredObject>, BackendError> {
        let Some(b) = self.objects.get(bucket) else {
            return Err(BackendError::NotFound(format!("bucket {}", bucket)));
        };
        let mut out: Vec<StoredObject> = b
            .values()
            .filter(|o| o.path.starts_with(prefix))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    async fn remove_objects(&self, bucket: &str, paths: &[String]) -> Result<u64, BackendError> {
        let Some(mut b) = self.objects.get_mut(bucket) else {
            return Ok(0);
        };
        Ok(paths.iter().filter(|p| b.remove(p.as_str()).is_some()).count() as u64)
    }

    async fn auth_user(&self, token: &str) -> Result<Option<AuthUser>, BackendError> {
        Ok(self.sessions.get(token).map(|u| u.value().clone()))
    }

    async fn ping(&self) -> Result<(), BackendError> {
        Ok(())
    }
}
