// Editorially curated featured events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::Event;

pub const TABLE: &str = "highlights";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: String,
    pub event_id: String,
    pub placement: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Highlight {
    /// Active and `now` within `[starts_at, ends_at]`; open ends are unbounded.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.starts_at.map(|s| s <= now).unwrap_or(true)
            && self.ends_at.map(|e| now <= e).unwrap_or(true)
    }
}

/// A live highlight joined with its event.
#[derive(Debug, Clone, Serialize)]
pub struct FeaturedEvent {
    pub highlight_id: String,
    pub position: i32,
    pub event: Event,
}
