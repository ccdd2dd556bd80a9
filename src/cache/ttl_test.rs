#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use tokio_util::sync::CancellationToken;

    use crate::cache::{Clock, Sweeper, TtlCache};

    struct ManualClock(Mutex<SystemTime>);

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000))))
        }

        fn advance(&self, d: Duration) {
            *self.0.lock() += d;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> SystemTime {
            *self.0.lock()
        }
    }

    fn cache(clock: &Arc<ManualClock>, ttl_secs: u64, capacity: usize) -> TtlCache<String> {
        TtlCache::with_clock("test", Duration::from_secs(ttl_secs), capacity, clock.clone())
    }

    #[test]
    fn test_get_returns_fresh_value() {
        let clock = ManualClock::new();
        let c = cache(&clock, 10, 8);
        c.set("events:sp", "payload".to_string());

        assert_eq!(c.get("events:sp").as_deref(), Some("payload"));
        let stats = c.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_expired_read_is_miss_and_evicts() {
        let clock = ManualClock::new();
        let c = cache(&clock, 10, 8);
        c.set("k", "v".to_string());

        // Exactly at expires_at the entry is still valid.
        clock.advance(Duration::from_secs(10));
        assert!(c.has("k"));

        clock.advance(Duration::from_millis(1));
        assert_eq!(c.get("k"), None);
        assert_eq!(c.len(), 0, "expired entry must be evicted on read");

        let stats = c.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expired, 1);
    }

    #[test]
    fn test_entry_timestamps() {
        let clock = ManualClock::new();
        let c = cache(&clock, 30, 8);
        let start = clock.now();
        c.set("k", "v".to_string());

        let entry = c.entry("k").unwrap();
        assert_eq!(entry.inserted_at, start);
        assert_eq!(entry.expires_at, start + Duration::from_secs(30));
    }

    #[test]
    fn test_capacity_evicts_in_insertion_order() {
        let clock = ManualClock::new();
        let c = cache(&clock, 60, 3);
        c.set("a", "1".to_string());
        c.set("b", "2".to_string());
        c.set("c", "3".to_string());

        // Reading "a" does not protect it: this is not LRU.
        assert!(c.get("a").is_some());
        c.set("d", "4".to_string());

        assert_eq!(c.len(), 3);
        assert!(!c.has("a"));
        assert!(c.has("b") && c.has("c") && c.has("d"));
        assert_eq!(c.stats().evicted, 1);
    }

    #[test]
    fn test_replacing_key_moves_it_to_the_back() {
        let clock = ManualClock::new();
        let c = cache(&clock, 60, 2);
        c.set("a", "1".to_string());
        c.set("b", "2".to_string());
        c.set("a", "1b".to_string());
        c.set("c", "3".to_string());

        assert!(!c.has("b"));
        assert_eq!(c.get("a").as_deref(), Some("1b"));
        assert!(c.has("c"));
    }

    #[test]
    fn test_len_never_exceeds_capacity() {
        let clock = ManualClock::new();
        let c = cache(&clock, 60, 5);
        for i in 0..50 {
            c.set(format!("k{}", i % 7), i.to_string());
            assert!(c.len() <= 5);
        }
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let clock = ManualClock::new();
        let c = cache(&clock, 10, 8);
        c.set("short", "x".to_string());
        c.set_with_ttl("long", "y".to_string(), Duration::from_secs(100));

        clock.advance(Duration::from_secs(11));
        assert_eq!(c.sweep(), 1);
        assert!(c.has("long"));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_invalidate_prefix_and_clear() {
        let clock = ManualClock::new();
        let c = cache(&clock, 60, 16);
        c.set("events:list:sp", "1".to_string());
        c.set("events:slug:x", "2".to_string());
        c.set("posts:list", "3".to_string());

        assert_eq!(c.invalidate_prefix("events:"), 2);
        assert!(c.has("posts:list"));

        c.clear();
        assert!(c.is_empty());
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with_caches_only_success() {
        let clock = ManualClock::new();
        let c = cache(&clock, 60, 8);
        let calls = AtomicUsize::new(0);

        let err: Result<String, &str> = c
            .get_or_try_insert_with("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("backend down")
            })
            .await;
        assert!(err.is_err());
        assert!(!c.has("k"));

        for _ in 0..3 {
            let v: Result<String, &str> = c
                .get_or_try_insert_with("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("fresh".to_string())
                })
                .await;
            assert_eq!(v.unwrap(), "fresh");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sweeper_runs_until_cancelled() {
        let clock = ManualClock::new();
        let c = Arc::new(cache(&clock, 1, 8));
        c.set("k", "v".to_string());
        clock.advance(Duration::from_secs(2));

        let token = CancellationToken::new();
        let handle = Sweeper::spawn(token.clone(), c.clone(), Duration::from_millis(5));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(c.len(), 0);

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}
