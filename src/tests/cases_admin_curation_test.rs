// Admin console: authorization, event and post curation, highlights and the read cache.

use serde_json::json;

use crate::support::{delete, get, post, put, slugs, start, ADMIN_TOKEN, USER_TOKEN};

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let app = start().await;
    let url = app.url("/api/admin/posts");

    assert_eq!(get(&url, None).await.status, 401);
    assert_eq!(get(&url, Some(USER_TOKEN)).await.status, 403);
    assert_eq!(get(&url, Some(ADMIN_TOKEN)).await.status, 200);

    let reply = delete(&app.url("/api/admin/cache"), Some(USER_TOKEN)).await;
    assert_eq!(reply.status, 403);
}

#[tokio::test]
async fn test_created_event_is_visible_immediately() {
    let app = start().await;
    let list = app.url("/api/events");

    // Warm the read cache.
    assert_eq!(get(&list, None).await.body["total"], 2);

    let reply = post(
        &app.url("/api/admin/events"),
        Some(ADMIN_TOKEN),
        json!({
            "title": "Forró no Parque",
            "starts_at": "2099-01-15T19:00:00Z",
            "city": "Recife",
            "categories": ["Forró"],
            "is_free": true,
            "status": "published"
        }),
    )
    .await;
    assert_eq!(reply.status, 201);
    assert_eq!(reply.body["slug"], "forro-no-parque");
    assert_eq!(reply.body["categories"][0], "forró");
    let id = reply.body["id"].as_str().expect("event id").to_string();

    let reply = get(&list, None).await;
    assert_eq!(
        slugs(&reply.body),
        vec!["forro-no-parque", "noite-de-jazz", "samba-na-praca"]
    );

    let reply = put(
        &app.url(&format!("/api/admin/events/{}", id)),
        Some(ADMIN_TOKEN),
        json!({
            "title": "Forró no Parque (adiado)",
            "starts_at": "2099-04-15T19:00:00Z",
            "city": "Recife",
            "status": "published"
        }),
    )
    .await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["slug"], "forro-no-parque");
    assert_eq!(
        slugs(&get(&list, None).await.body),
        vec!["noite-de-jazz", "samba-na-praca", "forro-no-parque"]
    );

    let reply = delete(&app.url(&format!("/api/admin/events/{}", id)), Some(ADMIN_TOKEN)).await;
    assert_eq!(reply.status, 204);
    assert_eq!(get(&list, None).await.body["total"], 2);
}

#[tokio::test]
async fn test_event_validation_errors() {
    let app = start().await;

    let reply = post(
        &app.url("/api/admin/events"),
        Some(ADMIN_TOKEN),
        json!({
            "title": "X",
            "city": "",
            "starts_at": "2099-01-15T19:00:00Z",
            "ends_at": "2099-01-14T19:00:00Z",
            "slug": "samba-na-praca"
        }),
    )
    .await;
    assert_eq!(reply.status, 400);
    for field in ["title", "city", "ends_at"] {
        assert!(reply.body["fields"][field].is_string(), "missing error for {}", field);
    }

    let reply = post(
        &app.url("/api/admin/events"),
        Some(ADMIN_TOKEN),
        json!({
            "title": "Outro Samba",
            "city": "São Paulo",
            "starts_at": "2099-01-15T19:00:00Z",
            "slug": "samba-na-praca"
        }),
    )
    .await;
    assert_eq!(reply.status, 400);
    assert!(reply.body["fields"]["slug"].is_string());
}

#[tokio::test]
async fn test_agent_curation() {
    let app = start().await;

    let reply = post(
        &app.url("/api/admin/agents/artist"),
        Some(ADMIN_TOKEN),
        json!({"name": "Bloco do Sol", "instagram": "@blocodosol2"}),
    )
    .await;
    assert_eq!(reply.status, 201);
    assert_eq!(reply.body["slug"], "bloco-do-sol-2");
    assert_eq!(reply.body["instagram"], "blocodosol2");
    let id = reply.body["id"].as_str().expect("agent id").to_string();

    let reply = get(&app.url("/api/agents/artist"), None).await;
    assert_eq!(reply.body["total"], 2);

    let reply = delete(&app.url(&format!("/api/admin/agents/artist/{}", id)), Some(ADMIN_TOKEN)).await;
    assert_eq!(reply.status, 204);
    let reply = get(&app.url("/api/agents/artist"), None).await;
    assert_eq!(reply.body["total"], 1);

    let reply = post(&app.url("/api/admin/agents/band"), Some(ADMIN_TOKEN), json!({"name": "X"})).await;
    assert_eq!(reply.status, 404);
}

#[tokio::test]
async fn test_highlight_reorder() {
    let app = start().await;
    let placement = app.url("/api/admin/placements/home/highlights");

    let reply = put(&placement, Some(ADMIN_TOKEN), json!({"ids": ["h1", "h2"]})).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body[0]["id"], "h1");
    assert_eq!(reply.body[0]["position"], 0);

    let public = get(&app.url("/api/highlights/home"), None).await;
    assert_eq!(public.body[0]["event"]["slug"], "samba-na-praca");

    let reply = put(&placement, Some(ADMIN_TOKEN), json!({"ids": ["h1"]})).await;
    assert_eq!(reply.status, 400);

    let reply = post(
        &app.url("/api/admin/highlights"),
        Some(ADMIN_TOKEN),
        json!({"event_id": "nope", "placement": "home"}),
    )
    .await;
    assert_eq!(reply.status, 400);
}

#[tokio::test]
async fn test_post_publish_flow() {
    let app = start().await;

    let reply = post(
        &app.url("/api/admin/posts"),
        Some(ADMIN_TOKEN),
        json!({"title": "Roteiro de Junho", "body": "Quadrilhas e fogueiras."}),
    )
    .await;
    assert_eq!(reply.status, 201);
    assert_eq!(reply.body["status"], "draft");
    let id = reply.body["id"].as_str().expect("post id").to_string();

    assert_eq!(get(&app.url("/api/posts/roteiro-de-junho"), None).await.status, 404);

    let reply = post(
        &app.url(&format!("/api/admin/posts/{}/publish", id)),
        Some(ADMIN_TOKEN),
        json!({}),
    )
    .await;
    assert_eq!(reply.status, 200);
    let published_at = reply.body["published_at"].clone();
    assert!(published_at.is_string());

    let reply = get(&app.url("/api/posts/roteiro-de-junho"), None).await;
    assert_eq!(reply.status, 200);

    post(&app.url(&format!("/api/admin/posts/{}/unpublish", id)), Some(ADMIN_TOKEN), json!({})).await;
    assert_eq!(get(&app.url("/api/posts/roteiro-de-junho"), None).await.status, 404);

    let reply = post(
        &app.url(&format!("/api/admin/posts/{}/publish", id)),
        Some(ADMIN_TOKEN),
        json!({}),
    )
    .await;
    assert_eq!(reply.body["published_at"], published_at);
}

#[tokio::test]
async fn test_cache_stats_and_clear() {
    let app = start().await;
    let cache = app.url("/api/admin/cache");

    get(&app.url("/api/events"), None).await;
    get(&app.url("/api/events"), None).await;

    let reply = get(&cache, Some(ADMIN_TOKEN)).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["enabled"], true);
    assert!(reply.body["stats"]["hits"].as_u64().unwrap_or(0) >= 1);
    assert!(reply.body["stats"]["len"].as_u64().unwrap_or(0) >= 1);

    let reply = delete(&cache, Some(ADMIN_TOKEN)).await;
    assert_eq!(reply.body["cleared"], true);
    let reply = get(&cache, Some(ADMIN_TOKEN)).await;
    assert_eq!(reply.body["stats"]["len"], 0);
}
