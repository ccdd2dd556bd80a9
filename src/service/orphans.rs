//! Storage-orphan scanning: objects in a bucket that no row points at.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::error::{Result, ServiceError};
use crate::backend::{Backend, Query};
use crate::config::{Bucket, Config, ConfigTrait};

pub const DEFAULT_MIN_AGE: Duration = Duration::from_secs(24 * 3600);
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Rows fetched per request when collecting references.
pub const REFERENCE_PAGE: usize = 500;

/// Path segments after which a storage URL names `<bucket>/<path>`.
const URL_MARKERS: [&str; 4] = [
    "/storage/v1/object/public/",
    "/storage/v1/object/sign/",
    "/storage/v1/object/authenticated/",
    "/storage/v1/render/image/public/",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BucketReport {
    pub bucket: String,
    pub scanned: usize,
    pub referenced: usize,
    /// Unreferenced objects younger than the minimum age.
    pub recent: usize,
    pub orphans: Vec<String>,
    pub removed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanReport {
    pub dry_run: bool,
    pub buckets: Vec<BucketReport>,
}

/// Object path inside `bucket` that a column value refers to.
///
/// Values are public/signed storage URLs or bare paths, optionally prefixed
/// with the bucket name; URLs pointing at other buckets or other hosts'
/// files yield `None`.
pub fn referenced_path(bucket: &str, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        let without_query = value.split(['?', '#']).next().unwrap_or(value);
        let rest = URL_MARKERS
            .iter()
            .find_map(|m| without_query.split_once(m).map(|(_, rest)| rest))?;
        let path = rest.strip_prefix(bucket)?.strip_prefix('/')?;
        let decoded = urlencoding::decode(path).ok()?;
        return Some(decoded.into_owned()).filter(|p| !p.is_empty());
    }
    let path = value.trim_start_matches('/');
    let path = path
        .strip_prefix(bucket)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path);
    Some(path.to_string()).filter(|p| !p.is_empty())
}

pub struct OrphanScanner {
    backend: Arc<dyn Backend>,
    buckets: Vec<Bucket>,
    min_age: Duration,
    batch_size: usize,
}

impl OrphanScanner {
    pub fn new(backend: Arc<dyn Backend>, buckets: Vec<Bucket>, min_age: Duration, batch_size: usize) -> Self {
        Self {
            backend,
            buckets,
            min_age,
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config(backend: Arc<dyn Backend>, cfg: &Config) -> Self {
        let storage = cfg.storage();
        Self::new(
            backend,
            storage.map(|s| s.buckets.clone()).unwrap_or_default(),
            storage.and_then(|s| s.min_age).unwrap_or(DEFAULT_MIN_AGE),
            storage.and_then(|s| s.batch_size).unwrap_or(DEFAULT_BATCH_SIZE),
        )
    }

    async fn referenced(&self, bucket: &Bucket) -> Result<HashSet<String>> {
        let mut paths = HashSet::new();
        for reference in &bucket.references {
            // The backend may cap a page below the requested size; stop on an empty page only.
            let mut offset = 0;
            loop {
                let query = Query::new()
                    .not_null(&reference.column)
                    .order("id", true)
                    .limit(REFERENCE_PAGE)
                    .offset(offset);
                let rows = self.backend.select(&reference.table, &query).await?;
                if rows.is_empty() {
                    break;
                }
                offset += rows.len();
                for row in rows {
                    let values: Vec<&str> = match row.get(&reference.column) {
                        Some(Value::String(s)) => vec![s.as_str()],
                        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
                        _ => Vec::new(),
                    };
                    paths.extend(values.into_iter().filter_map(|v| referenced_path(&bucket.name, v)));
                }
            }
        }
        Ok(paths)
    }

    async fn scan_bucket(&self, bucket: &Bucket, dry_run: bool, now: DateTime<Utc>) -> Result<BucketReport> {
        let objects = self.backend.list_objects(&bucket.name, "").await?;
        let referenced = self.referenced(bucket).await?;
        let min_age = chrono::Duration::from_std(self.min_age)
            .map_err(|e| ServiceError::BadRequest(format!("storage.min_age: {}", e)))?;

        let mut report = BucketReport {
            bucket: bucket.name.clone(),
            scanned: objects.len(),
            ..BucketReport::default()
        };
        for object in objects {
            if referenced.contains(&object.path) {
                report.referenced += 1;
                continue;
            }
            // Objects of unknown age may be uploads in flight.
            let old_enough = object
                .created_at
                .map(|created| now - created >= min_age)
                .unwrap_or(false);
            if old_enough {
                report.orphans.push(object.path);
            } else {
                report.recent += 1;
            }
        }

        if !dry_run {
            for batch in report.orphans.chunks(self.batch_size) {
                report.removed += self.backend.remove_objects(&bucket.name, batch).await?;
            }
        }

        crate::metrics::add_orphans(&bucket.name, report.orphans.len() as u64, report.removed);
        info!(
            component = "orphans",
            event = "bucket_scanned",
            bucket = %bucket.name,
            scanned = report.scanned,
            referenced = report.referenced,
            orphans = report.orphans.len(),
            removed = report.removed,
            dry_run,
            "bucket scanned"
        );
        Ok(report)
    }

    /// Scans every configured bucket; removes orphans unless `dry_run`.
    pub async fn scan(&self, dry_run: bool) -> Result<OrphanReport> {
        let now = crate::time::now_utc();
        let mut buckets = Vec::with_capacity(self.buckets.len());
        for bucket in &self.buckets {
            buckets.push(self.scan_bucket(bucket, dry_run, now).await?);
        }
        Ok(OrphanReport { dry_run, buckets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_paths_from_urls_and_bare_values() {
        let url = "https://abc.supabase.co/storage/v1/object/public/avatars/artists/1/a%20b.webp?v=2";
        assert_eq!(referenced_path("avatars", url).as_deref(), Some("artists/1/a b.webp"));
        assert_eq!(referenced_path("covers", url), None);
        assert_eq!(
            referenced_path("avatars", "https://cdn.example.com/avatars/x.png"),
            None
        );
        assert_eq!(
            referenced_path("avatars", "/artists/2/x.png").as_deref(),
            Some("artists/2/x.png")
        );
        assert_eq!(
            referenced_path("avatars", "avatars/artists/1/a.webp").as_deref(),
            Some("artists/1/a.webp")
        );
        assert_eq!(referenced_path("avatars", "avatars/"), None);
        assert_eq!(referenced_path("avatars", "  "), None);
    }
}
