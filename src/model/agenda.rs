//! Legacy agenda records and their adapter into [`Event`].
//!
//! The `agenda_itens` table predates `events`; both are still written by
//! older admin flows, so reads unify them here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::{Event, EventSource};
use super::PublishStatus;

pub const TABLE: &str = "agenda_itens";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaItem {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub start_at: DateTime<Utc>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    pub city: String,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ticket_url: Option<String>,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<AgendaItem> for Event {
    fn from(item: AgendaItem) -> Self {
        Event {
            id: item.id,
            slug: item.slug,
            title: item.title,
            description: item.summary,
            starts_at: item.start_at,
            ends_at: item.end_at,
            city: item.city,
            venue_id: None,
            venue_name: item.location_name,
            organizer_id: None,
            artist_ids: Vec::new(),
            categories: item.tags,
            cover_url: item.cover_url,
            ticket_url: item.ticket_url,
            price_min: None,
            is_free: false,
            status: item.status,
            source: EventSource::Legacy,
            created_at: item.created_at,
        }
    }
}

/// Merges `events` rows with adapted legacy rows.
///
/// Only published items survive; when a slug exists in both tables the
/// `events` row wins. The result is ordered by start time, then slug.
pub fn unify(events: Vec<Event>, legacy: Vec<AgendaItem>) -> Vec<Event> {
    let mut out: Vec<Event> = events
        .into_iter()
        .filter(|e| e.status.is_published())
        .collect();

    let taken: std::collections::HashSet<String> = out.iter().map(|e| e.slug.clone()).collect();

    out.extend(
        legacy
            .into_iter()
            .filter(|item| item.status.is_published() && !taken.contains(&item.slug))
            .map(Event::from),
    );

    out.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then_with(|| a.slug.cmp(&b.slug)));
    out
}
