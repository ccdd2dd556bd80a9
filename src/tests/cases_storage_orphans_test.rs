// Storage orphan scan.

use crate::support::{do_request, start, ADMIN_TOKEN, USER_TOKEN};

const ORPHANS: &str = "/functions/storage-orphans";

#[tokio::test]
async fn test_scan_defaults_to_dry_run() {
    let app = start().await;

    let reply = do_request("POST", &app.url(ORPHANS), Some(USER_TOKEN), &[], None).await;
    assert_eq!(reply.status, 403);

    let reply = do_request("POST", &app.url(ORPHANS), Some(ADMIN_TOKEN), &[], None).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["dry_run"], true);

    let avatars = &reply.body["buckets"][0];
    assert_eq!(avatars["bucket"], "avatars");
    assert_eq!(avatars["scanned"], 2);
    assert_eq!(avatars["referenced"], 1);
    assert_eq!(avatars["orphans"][0], "stale.png");
    assert_eq!(avatars["removed"], 0);

    let covers = &reply.body["buckets"][1];
    assert_eq!(covers["recent"], 1);
    assert_eq!(covers["orphans"].as_array().map(Vec::len), Some(0));

    assert!(app.backend.has_object("avatars", "stale.png"));
}

#[tokio::test]
async fn test_scan_removes_orphans_when_asked() {
    let app = start().await;
    let url = app.url(&format!("{}?dry_run=false", ORPHANS));

    let reply = do_request("POST", &url, Some(ADMIN_TOKEN), &[], None).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["dry_run"], false);
    assert_eq!(reply.body["buckets"][0]["removed"], 1);

    assert!(!app.backend.has_object("avatars", "stale.png"));
    assert!(app.backend.has_object("avatars", "a1.png"));
    assert!(app.backend.has_object("covers", "fresh.jpg"));

    let reply = do_request("POST", &url, Some(ADMIN_TOKEN), &[], None).await;
    assert_eq!(reply.body["buckets"][0]["orphans"].as_array().map(Vec::len), Some(0));
}
