// Artist, venue and organizer profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::event::Event;
use super::social::SocialCounts;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    #[default]
    Artist,
    Venue,
    Organizer,
}

impl AgentKind {
    pub const ALL: [AgentKind; 3] = [AgentKind::Artist, AgentKind::Venue, AgentKind::Organizer];

    /// Backing table of this kind of agent.
    pub fn table(self) -> &'static str {
        match self {
            AgentKind::Artist => "artists",
            AgentKind::Venue => "venues",
            AgentKind::Organizer => "organizers",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::Artist => "artist",
            AgentKind::Venue => "venue",
            AgentKind::Organizer => "organizer",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown agent kind {0:?}")]
pub struct UnknownAgentKind(pub String);

impl FromStr for AgentKind {
    type Err = UnknownAgentKind;

    /// Accepts both the singular kind and the table name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "artist" | "artists" => Ok(AgentKind::Artist),
            "venue" | "venues" => Ok(AgentKind::Venue),
            "organizer" | "organizers" => Ok(AgentKind::Organizer),
            other => Err(UnknownAgentKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    /// Not a column: set from the table the row was read from.
    #[serde(default)]
    pub kind: AgentKind,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Everything a profile page renders.
#[derive(Debug, Clone, Serialize)]
pub struct AgentProfile {
    pub agent: Agent,
    pub upcoming_events: Vec<Event>,
    pub counts: SocialCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_from_path_segments() {
        assert_eq!("venue".parse::<AgentKind>().unwrap(), AgentKind::Venue);
        assert_eq!("organizers".parse::<AgentKind>().unwrap(), AgentKind::Organizer);
        assert!("band".parse::<AgentKind>().is_err());
    }

    #[test]
    fn kind_defaults_when_rows_lack_it() {
        let row = serde_json::json!({"id": "1", "slug": "x", "name": "X"});
        let agent: Agent = serde_json::from_value(row).unwrap();
        assert_eq!(agent.kind, AgentKind::Artist);
        assert!(agent.links.is_empty());
    }
}
