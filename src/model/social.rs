// Follows, attendance, reviews and comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::agent::AgentKind;

pub const FOLLOWS_TABLE: &str = "follows";
pub const ATTENDANCE_TABLE: &str = "event_attendance";
pub const REVIEWS_TABLE: &str = "reviews";
pub const COMMENTS_TABLE: &str = "comments";

/// RPC returning aggregate social counters for one entity.
pub const SOCIAL_COUNTS_RPC: &str = "get_social_counts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Artist,
    Venue,
    Organizer,
    Event,
    Post,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Artist => "artist",
            EntityType::Venue => "venue",
            EntityType::Organizer => "organizer",
            EntityType::Event => "event",
            EntityType::Post => "post",
        }
    }
}

impl From<AgentKind> for EntityType {
    fn from(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Artist => EntityType::Artist,
            AgentKind::Venue => EntityType::Venue,
            AgentKind::Organizer => EntityType::Organizer,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "artist" => Ok(EntityType::Artist),
            "venue" => Ok(EntityType::Venue),
            "organizer" => Ok(EntityType::Organizer),
            "event" => Ok(EntityType::Event),
            "post" => Ok(EntityType::Post),
            other => Err(format!("unknown entity type {:?}", other)),
        }
    }
}

/// Points at any followable/reviewable record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub entity_id: String,
}

impl EntityRef {
    pub fn new(entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.into(),
        }
    }

    /// Cache key fragment, e.g. `artist:42`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.entity_type, self.entity_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Follow {
    pub user_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Going,
    Interested,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub user_id: String,
    pub event_id: String,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub body: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialCounts {
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub going: u64,
    #[serde(default)]
    pub interested: u64,
    #[serde(default)]
    pub reviews: u64,
    #[serde(default)]
    pub average_rating: Option<f64>,
}
