use super::{
    Api, Backend, BackendMode, Bucket, Cache, Compression, Config, Forms, Logs, Probe, Push,
    RateLimit, RoleBox, Runtime, Storage, StorageReference, K8S,
};
use std::time::Duration;

fn reference(table: &str, column: &str) -> StorageReference {
    StorageReference {
        table: table.to_string(),
        column: column.to_string(),
    }
}

/// Creates a new test configuration backed by the in-memory backend.
pub fn new_test_config() -> Config {
    Config {
        role: RoleBox {
            env: super::TEST.to_string(),
            logs: Some(Logs {
                level: Some("debug".to_string()),
            }),
            runtime: Some(Runtime { num_cpus: 2 }),
            api: Some(Api {
                name: Some("role-test".to_string()),
                port: Some("0".to_string()),
                allowed_origins: Some(vec!["http://localhost:5173".to_string()]),
                timeout: Some(Duration::from_secs(10)),
            }),
            backend: Backend {
                mode: BackendMode::Memory,
                url: None,
                anon_key: None,
                service_key: None,
                timeout: Some(Duration::from_secs(5)),
            },
            cache: Some(Cache {
                enabled: true,
                ttl: Some(Duration::from_secs(60)),
                capacity: Some(256),
                sweep_interval: Some(Duration::from_secs(30)),
            }),
            forms: Some(Forms {
                newsletter: Some(RateLimit {
                    requests: 3,
                    window: Duration::from_secs(600),
                }),
                job_application: Some(RateLimit {
                    requests: 2,
                    window: Duration::from_secs(3600),
                }),
                cleanup_interval: Some(Duration::from_secs(60)),
            }),
            push: Some(Push {
                enabled: true,
                relay_url: Some("http://127.0.0.1:1/push".to_string()),
                relay_token: None,
                concurrency: Some(4),
                timeout: Some(Duration::from_secs(2)),
                message_ttl: Some(Duration::from_secs(3600)),
            }),
            storage: Some(Storage {
                buckets: vec![
                    Bucket {
                        name: "avatars".to_string(),
                        references: vec![
                            reference("artists", "avatar_url"),
                            reference("venues", "avatar_url"),
                            reference("organizers", "avatar_url"),
                        ],
                    },
                    Bucket {
                        name: "covers".to_string(),
                        references: vec![
                            reference("events", "cover_url"),
                            reference("agenda_itens", "cover_url"),
                            reference("revista_posts", "cover_url"),
                        ],
                    },
                ],
                min_age: Some(Duration::from_secs(3600)),
                batch_size: Some(2),
            }),
            compression: Some(Compression { enabled: false }),
            k8s: Some(K8S {
                probe: Probe {
                    timeout: Some(Duration::from_secs(2)),
                },
            }),
        },
    }
}
