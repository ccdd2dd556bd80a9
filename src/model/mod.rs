//! Domain records as stored in the hosted backend's tables.

pub mod agenda;
pub mod agent;
pub mod event;
pub mod forms;
pub mod highlight;
pub mod push;
pub mod revista;
pub mod social;
pub mod user;

#[cfg(test)]
mod agenda_test;

use serde::{Deserialize, Serialize};

pub use agenda::AgendaItem;
pub use agent::{Agent, AgentKind, AgentProfile};
pub use event::{Event, EventSource};
pub use forms::{JobApplication, NewsletterSubscription};
pub use highlight::{FeaturedEvent, Highlight};
pub use push::{PushPayload, PushSubscription, PushTarget};
pub use revista::RevistaPost;
pub use social::{
    Attendance, AttendanceStatus, Comment, EntityRef, EntityType, Follow, Review, SocialCounts,
};
pub use user::AuthUser;

/// Editorial state shared by events, agenda items and revista posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    #[default]
    Draft,
    #[serde(alias = "publicado")]
    Published,
    #[serde(alias = "cancelado")]
    Cancelled,
}

impl PublishStatus {
    pub fn is_published(self) -> bool {
        self == PublishStatus::Published
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PublishStatus::Draft => "draft",
            PublishStatus::Published => "published",
            PublishStatus::Cancelled => "cancelled",
        }
    }
}
