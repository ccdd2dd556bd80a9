// Web-push subscriptions and fan-out requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::social::EntityRef;

pub const TABLE: &str = "push_subscriptions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub id: String,
    pub user_id: String,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// What the service worker displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Who receives a fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushTarget {
    All,
    Users(Vec<String>),
    Followers(EntityRef),
}
