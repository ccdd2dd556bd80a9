// End-to-end harness: a real server on an ephemeral port over the memory backend.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::app::App;
use crate::backend::{Backend, MemoryBackend};
use crate::config::{self, Config, ConfigTrait};
use crate::liveness::Probe;
use crate::model::{AuthUser, PushPayload, PushSubscription};
use crate::service::push::Delivery;
use crate::service::{PushSender, PushService, Services};

pub const USER_TOKEN: &str = "user-token";
pub const ADMIN_TOKEN: &str = "admin-token";

/// Push sender recording every endpoint; endpoints ending in `/gone` expire.
#[derive(Default)]
pub struct RecordingSender {
    pub seen: Mutex<Vec<String>>,
}

#[async_trait]
impl PushSender for RecordingSender {
    async fn deliver(&self, sub: &PushSubscription, _payload: &PushPayload) -> Delivery {
        self.seen.lock().push(sub.endpoint.clone());
        if sub.endpoint.ends_with("/gone") {
            Delivery::Gone
        } else {
            Delivery::Delivered
        }
    }
}

/// A running service instance; stops when dropped.
pub struct TestApp {
    pub addr: SocketAddr,
    pub backend: Arc<MemoryBackend>,
    pub sender: Arc<RecordingSender>,
    pub app: App,
    shutdown_token: CancellationToken,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

fn seed(backend: &MemoryBackend) {
    backend.add_session(
        USER_TOKEN,
        AuthUser {
            id: "u1".to_string(),
            email: Some("ana@example.com".to_string()),
            is_admin: false,
        },
    );
    backend.add_session(
        ADMIN_TOKEN,
        AuthUser {
            id: "admin".to_string(),
            email: Some("editor@role.app".to_string()),
            is_admin: true,
        },
    );

    backend.seed(
        "events",
        vec![
            json!({
                "id": "e1", "slug": "samba-na-praca", "title": "Samba na Praça",
                "starts_at": "2099-03-01T20:00:00Z", "city": "São Paulo",
                "venue_id": "v1", "artist_ids": ["a1"], "categories": ["samba"],
                "is_free": true, "status": "published"
            }),
            json!({
                "id": "e2", "slug": "noite-de-jazz", "title": "Noite de Jazz",
                "starts_at": "2099-02-01T22:00:00Z", "city": "Recife",
                "categories": ["jazz"], "price_min": 40.0, "status": "published"
            }),
            json!({
                "id": "e3", "slug": "rascunho", "title": "Rascunho",
                "starts_at": "2099-01-01T20:00:00Z", "city": "Recife", "status": "draft"
            }),
        ],
    );
    backend.seed(
        "artists",
        vec![json!({
            "id": "a1", "slug": "bloco-do-sol", "name": "Bloco do Sol",
            "city": "São Paulo", "avatar_url": "a1.png"
        })],
    );
    backend.seed(
        "venues",
        vec![json!({"id": "v1", "slug": "praca-roosevelt", "name": "Praça Roosevelt", "city": "São Paulo"})],
    );
    backend.seed(
        "highlights",
        vec![
            json!({"id": "h1", "event_id": "e1", "placement": "home", "position": 1}),
            json!({"id": "h2", "event_id": "e2", "placement": "home", "position": 0}),
        ],
    );
    backend.seed(
        "revista_posts",
        vec![json!({
            "id": "p1", "slug": "guia-do-carnaval", "title": "Guia do Carnaval",
            "body": "Tudo sobre os blocos.", "status": "published",
            "published_at": "2024-02-01T12:00:00Z"
        })],
    );
    backend.seed(
        "push_subscriptions",
        vec![
            json!({"id": "s1", "user_id": "u1", "endpoint": "https://push.example.com/a", "p256dh": "k", "auth": "a"}),
            json!({"id": "s2", "user_id": "u2", "endpoint": "https://push.example.com/gone", "p256dh": "k", "auth": "a"}),
        ],
    );

    let old = crate::time::now_utc() - chrono::Duration::days(2);
    backend.put_object("avatars", "a1.png", Some(old), Some(512));
    backend.put_object("avatars", "stale.png", Some(old), Some(512));
    backend.put_object("covers", "fresh.jpg", Some(crate::time::now_utc()), Some(2048));
}

/// Starts a seeded instance with the test configuration.
pub async fn start() -> TestApp {
    start_with(config::new_test_config()).await
}

/// Starts a seeded instance with `cfg`; push delivery is recorded when enabled.
pub async fn start_with(cfg: Config) -> TestApp {
    let backend = Arc::new(MemoryBackend::new());
    seed(&backend);

    // Delivery goes to the recorder instead of a relay; disabled push has no sender.
    let sender = Arc::new(RecordingSender::default());
    let push_enabled = cfg.push().map(|p| p.enabled).unwrap_or(false);
    let push = PushService::new(
        backend.clone() as Arc<dyn Backend>,
        push_enabled.then(|| sender.clone() as Arc<dyn PushSender>),
        4,
    );
    let services = Services::with_push(&cfg, backend.clone() as Arc<dyn Backend>, push);

    let shutdown_token = CancellationToken::new();
    let probe = Arc::new(Probe::new(Duration::from_secs(2)));
    let app = App::with_services(shutdown_token.clone(), cfg, services, probe)
        .expect("failed to build app");

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");

    let serving = app.clone();
    tokio::spawn(async move {
        if let Err(e) = serving.serve_on(listener).await {
            eprintln!("[e2e] server stopped: {}", e);
        }
    });

    TestApp {
        addr,
        backend,
        sender,
        app,
        shutdown_token,
    }
}
