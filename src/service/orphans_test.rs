#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::backend::{Backend, BackendError, MemoryBackend, Query, StoredObject};
    use crate::model::AuthUser;
    use crate::config::{Bucket, StorageReference};
    use crate::service::OrphanScanner;

    const BASE: &str = "https://abc.supabase.co/storage/v1/object/public";

    fn bucket() -> Bucket {
        Bucket {
            name: "avatars".to_string(),
            references: vec![
                StorageReference {
                    table: "artists".to_string(),
                    column: "avatar_url".to_string(),
                },
                StorageReference {
                    table: "venues".to_string(),
                    column: "avatar_url".to_string(),
                },
            ],
        }
    }

    fn seeded() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        let old = Some(Utc::now() - ChronoDuration::days(3));
        let fresh = Some(Utc::now() - ChronoDuration::minutes(5));
        backend.put_object("avatars", "artists/1/a.webp", old, Some(10));
        backend.put_object("avatars", "venues/2/b.webp", old, Some(10));
        backend.put_object("avatars", "artists/9/orphan.webp", old, Some(10));
        backend.put_object("avatars", "artists/9/orphan2.webp", old, Some(10));
        backend.put_object("avatars", "artists/9/orphan3.webp", old, Some(10));
        backend.put_object("avatars", "artists/9/uploading.webp", fresh, Some(10));
        backend.seed(
            "artists",
            vec![
                json!({"slug": "a", "name": "A", "avatar_url": format!("{}/avatars/artists/1/a.webp", BASE)}),
                json!({"slug": "n", "name": "N", "avatar_url": null}),
            ],
        );
        backend.seed(
            "venues",
            vec![json!({"slug": "b", "name": "B", "avatar_url": "venues/2/b.webp"})],
        );
        backend
    }

    /// Memory backend whose selects return at most `cap` rows, like a
    /// hosted REST API with a server-side row limit.
    struct CappedBackend {
        inner: Arc<MemoryBackend>,
        cap: usize,
    }

    #[async_trait]
    impl Backend for CappedBackend {
        async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, BackendError> {
            let mut rows = self.inner.select(table, query).await?;
            rows.truncate(self.cap);
            Ok(rows)
        }

        async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError> {
            self.inner.insert(table, row).await
        }

        async fn upsert(&self, table: &str, row: Value, on_conflict: &[&str]) -> Result<Value, BackendError> {
            self.inner.upsert(table, row, on_conflict).await
        }

        async fn update(&self, table: &str, query: &Query, patch: Value) -> Result<Vec<Value>, BackendError> {
            self.inner.update(table, query, patch).await
        }

        async fn delete(&self, table: &str, query: &Query) -> Result<u64, BackendError> {
            self.inner.delete(table, query).await
        }

        async fn rpc(&self, name: &str, params: Value) -> Result<Value, BackendError> {
            self.inner.rpc(name, params).await
        }

        async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<StoredObject>, BackendError> {
            self.inner.list_objects(bucket, prefix).await
        }

        async fn remove_objects(&self, bucket: &str, paths: &[String]) -> Result<u64, BackendError> {
            self.inner.remove_objects(bucket, paths).await
        }

        async fn auth_user(&self, token: &str) -> Result<Option<AuthUser>, BackendError> {
            self.inner.auth_user(token).await
        }

        async fn ping(&self) -> Result<(), BackendError> {
            self.inner.ping().await
        }
    }

    #[tokio::test]
    async fn test_references_beyond_the_server_row_cap_are_kept() {
        let inner = Arc::new(MemoryBackend::new());
        let old = Some(Utc::now() - ChronoDuration::days(3));
        let rows: Vec<_> = (0..7)
            .map(|i| {
                let path = format!("artists/{}/a.webp", i);
                inner.put_object("avatars", &path, old, Some(10));
                json!({"slug": format!("a{}", i), "name": "A", "avatar_url": path})
            })
            .collect();
        inner.seed("artists", rows);
        inner.put_object("avatars", "artists/99/orphan.webp", old, Some(10));

        let backend = Arc::new(CappedBackend {
            inner: inner.clone(),
            cap: 3,
        });
        let scanner = OrphanScanner::new(backend, vec![bucket()], Duration::from_secs(3600), 10);

        let report = scanner.scan(false).await.unwrap();
        let b = &report.buckets[0];
        assert_eq!(b.referenced, 7);
        assert_eq!(b.orphans, vec!["artists/99/orphan.webp"]);
        assert_eq!(b.removed, 1);
        for i in 0..7 {
            assert!(inner.has_object("avatars", &format!("artists/{}/a.webp", i)));
        }
    }

    #[tokio::test]
    async fn test_bucket_prefixed_values_count_as_references() {
        let backend = seeded();
        backend.put_object(
            "avatars",
            "artists/5/full.webp",
            Some(Utc::now() - ChronoDuration::days(3)),
            Some(10),
        );
        backend.seed(
            "artists",
            vec![json!({"slug": "f", "name": "F", "avatar_url": "avatars/artists/5/full.webp"})],
        );
        let scanner = OrphanScanner::new(backend.clone(), vec![bucket()], Duration::from_secs(3600), 10);

        let report = scanner.scan(false).await.unwrap();
        assert_eq!(report.buckets[0].referenced, 3);
        assert!(!report.buckets[0].orphans.contains(&"artists/5/full.webp".to_string()));
        assert!(backend.has_object("avatars", "artists/5/full.webp"));
    }

    #[tokio::test]
    async fn test_dry_run_reports_without_removing() {
        let backend = seeded();
        let scanner = OrphanScanner::new(backend.clone(), vec![bucket()], Duration::from_secs(3600), 2);

        let report = scanner.scan(true).await.unwrap();
        assert!(report.dry_run);
        let b = &report.buckets[0];
        assert_eq!(b.scanned, 6);
        assert_eq!(b.referenced, 2);
        assert_eq!(b.recent, 1);
        assert_eq!(
            b.orphans,
            vec![
                "artists/9/orphan.webp",
                "artists/9/orphan2.webp",
                "artists/9/orphan3.webp"
            ]
        );
        assert_eq!(b.removed, 0);
        assert!(backend.has_object("avatars", "artists/9/orphan.webp"));
    }

    #[tokio::test]
    async fn test_removal_in_batches_spares_referenced_and_recent() {
        let backend = seeded();
        let scanner = OrphanScanner::new(backend.clone(), vec![bucket()], Duration::from_secs(3600), 2);

        let report = scanner.scan(false).await.unwrap();
        assert_eq!(report.buckets[0].removed, 3);
        assert!(!backend.has_object("avatars", "artists/9/orphan3.webp"));
        assert!(backend.has_object("avatars", "artists/1/a.webp"));
        assert!(backend.has_object("avatars", "venues/2/b.webp"));
        assert!(backend.has_object("avatars", "artists/9/uploading.webp"));

        let again = scanner.scan(false).await.unwrap();
        assert!(again.buckets[0].orphans.is_empty());
    }

    #[tokio::test]
    async fn test_missing_bucket_is_an_error() {
        let backend = Arc::new(MemoryBackend::new());
        let scanner = OrphanScanner::new(backend, vec![bucket()], Duration::from_secs(60), 10);
        assert!(scanner.scan(true).await.is_err());
    }
}
