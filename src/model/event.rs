// Event records from the `events` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PublishStatus;

pub const TABLE: &str = "events";

/// Which table an event was read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    #[default]
    Events,
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    pub city: String,
    #[serde(default)]
    pub venue_id: Option<String>,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub organizer_id: Option<String>,
    #[serde(default)]
    pub artist_ids: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub ticket_url: Option<String>,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub source: EventSource,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    /// An event is over once its end (or start, when it has no end) is in the past.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.ends_at.unwrap_or(self.starts_at) < now
    }

    /// Whether the agent with `agent_id` takes part in the event in any role.
    pub fn involves(&self, agent_id: &str) -> bool {
        self.venue_id.as_deref() == Some(agent_id)
            || self.organizer_id.as_deref() == Some(agent_id)
            || self.artist_ids.iter().any(|a| a == agent_id)
    }

    pub fn has_category(&self, category: &str) -> bool {
        let category = category.to_lowercase();
        self.categories
            .iter()
            .any(|c| c.to_lowercase() == category)
    }
}
