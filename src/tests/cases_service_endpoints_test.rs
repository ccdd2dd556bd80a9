// Operational endpoints and cross-cutting HTTP behavior.

use crate::controller::metrics::init_prometheus_exporter;
use crate::support::{client, get, start};

#[tokio::test]
async fn test_liveness_probe() {
    let app = start().await;

    let reply = get(&app.url("/k8s/probe"), None).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["message"], "I'm fine :D");
}

#[tokio::test]
async fn test_show_config_hides_secrets() {
    let app = start().await;

    let reply = get(&app.url("/role/config"), None).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["role"]["env"], "test");
    assert_eq!(reply.body["role"]["backend"]["mode"], "memory");
    assert!(reply.body["role"]["backend"].get("service_key").is_none());
}

#[tokio::test]
async fn test_metrics_are_exposed() {
    init_prometheus_exporter().expect("recorder installs");
    let app = start().await;

    // Produce at least one counted response.
    get(&app.url("/api/events"), None).await;

    let resp = client()
        .get(app.url("/metrics"))
        .send()
        .await
        .expect("metrics request");
    assert_eq!(resp.status().as_u16(), 200);
    let text = resp.text().await.expect("metrics body");
    assert!(text.contains("resp_status_total"), "got:\n{}", text);
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let app = start().await;

    let resp = client()
        .request(reqwest::Method::OPTIONS, app.url("/api/events"))
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "GET")
        .send()
        .await
        .expect("preflight request");
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );

    let resp = client()
        .get(app.url("/api/events"))
        .header("origin", "https://evil.example.com")
        .send()
        .await
        .expect("cross-origin request");
    assert!(resp.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = start().await;
    assert_eq!(get(&app.url("/api/nope"), None).await.status, 404);
}
