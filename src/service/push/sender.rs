//! Delivery of one notification to one browser subscription.

use async_trait::async_trait;
use bytes::Bytes;
use hyper::{Method, Uri};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::http::client::{create_client, send, HyperClient};
use crate::model::{PushPayload, PushSubscription};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MESSAGE_TTL: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "lowercase")]
pub enum Delivery {
    Delivered,
    /// The push service no longer knows the subscription (HTTP 404/410).
    Gone,
    Failed(String),
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn deliver(&self, subscription: &PushSubscription, payload: &PushPayload) -> Delivery;
}

/// Maps the push service's status, as relayed, onto a delivery outcome.
pub fn classify(status: u16, body: &str) -> Delivery {
    match status {
        200..=299 => Delivery::Delivered,
        404 | 410 => Delivery::Gone,
        other => Delivery::Failed(format!("status {}: {}", other, body)),
    }
}

/// Hands each notification to a web-push relay, which signs and encrypts it.
///
/// Request body: `{"subscription": {endpoint, keys}, "payload": {...}, "ttl": secs}`.
/// The relay answers with the push service's status code.
pub struct RelayPushSender {
    client: HyperClient,
    url: Uri,
    token: Option<String>,
    timeout: Duration,
    ttl: Duration,
}

impl RelayPushSender {
    pub fn new(
        url: &str,
        token: Option<String>,
        timeout: Option<Duration>,
        ttl: Option<Duration>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: create_client()?,
            url: url.parse()?,
            token,
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
            ttl: ttl.unwrap_or(DEFAULT_MESSAGE_TTL),
        })
    }
}

#[async_trait]
impl PushSender for RelayPushSender {
    async fn deliver(&self, subscription: &PushSubscription, payload: &PushPayload) -> Delivery {
        let body = json!({
            "subscription": {
                "endpoint": subscription.endpoint,
                "keys": {"p256dh": subscription.p256dh, "auth": subscription.auth},
            },
            "payload": payload,
            "ttl": self.ttl.as_secs(),
        });
        let body = match serde_json::to_vec(&body) {
            Ok(b) => Bytes::from(b),
            Err(e) => return Delivery::Failed(e.to_string()),
        };

        let mut headers = vec![("content-type", "application/json".to_string())];
        if let Some(token) = &self.token {
            headers.push(("authorization", format!("Bearer {}", token)));
        }

        match send(
            &self.client,
            Method::POST,
            self.url.clone(),
            &headers,
            Some(body),
            self.timeout,
        )
        .await
        {
            Ok(reply) => {
                let outcome = classify(reply.status, &reply.body_snippet());
                debug!(component = "push", subscription = %subscription.id, ?outcome, "relay answered");
                outcome
            }
            Err(e) => Delivery::Failed(e.to_string()),
        }
    }
}
