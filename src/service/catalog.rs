//! Public reads: events (unified with the legacy agenda), agents, highlights
//! and revista posts. Every read goes through the [`ReadCache`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::error::{Result, ServiceError};
use super::read_cache::ReadCache;
use super::social;
use crate::backend::{fetch, fetch_one, Backend, Filter, Query};
use crate::model::{
    agenda, event, highlight, revista, Agent, AgendaItem, AgentKind, AgentProfile,
    EntityRef, Event, FeaturedEvent, Highlight, RevistaPost,
};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;
/// Upcoming events shown on an agent profile.
pub const PROFILE_EVENTS: usize = 50;

/// Published statuses as written by current and legacy admin flows.
pub(crate) const PUBLISHED: [&str; 2] = ["published", "publicado"];

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Clamps a requested page size to `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn paginate<T>(items: Vec<T>, limit: usize, offset: usize) -> Page<T> {
    let total = items.len();
    let items = items.into_iter().skip(offset).take(limit).collect();
    Page {
        items,
        total,
        limit,
        offset,
    }
}

/// Strips characters with meaning in filter syntax from free-text search.
pub fn search_term(q: &str) -> Option<String> {
    let cleaned: String = q
        .chars()
        .filter(|c| !matches!(c, '%' | '*' | ',' | '(' | ')' | '"' | '\\'))
        .collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Artist, venue or organizer id taking part in the event.
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub free: bool,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub include_past: bool,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl EventFilter {
    /// Trims inputs and drops empty ones so equal filters share a cache key.
    pub fn normalized(mut self) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self.city = self.city.as_deref().and_then(search_term);
        self.category = clean(self.category).map(|c| c.to_lowercase());
        self.agent = clean(self.agent);
        self.q = self.q.as_deref().and_then(search_term);
        self.limit = Some(clamp_limit(self.limit));
        self.offset = Some(self.offset.unwrap_or(0));
        self
    }

    /// Canonical string of the filter; call on a normalized filter.
    pub fn cache_key(&self) -> String {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        let ts = |v: &Option<DateTime<Utc>>| v.map(|t| t.timestamp().to_string()).unwrap_or_default();
        format!(
            "events:list?city={}&category={}&agent={}&from={}&to={}&free={}&q={}&past={}&limit={}&offset={}",
            opt(&self.city).to_lowercase(),
            opt(&self.category),
            opt(&self.agent),
            ts(&self.from),
            ts(&self.to),
            self.free,
            opt(&self.q).to_lowercase(),
            self.include_past,
            self.limit.unwrap_or(DEFAULT_LIMIT),
            self.offset.unwrap_or(0),
        )
    }

    /// Full predicate, applied after merging both tables.
    pub fn accepts(&self, e: &Event, now: DateTime<Utc>) -> bool {
        if !e.status.is_published() {
            return false;
        }
        if !self.include_past && e.is_past(now) {
            return false;
        }
        if let Some(city) = &self.city {
            if e.city.to_lowercase() != city.to_lowercase() {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !e.has_category(category) {
                return false;
            }
        }
        if let Some(agent) = &self.agent {
            if !e.involves(agent) {
                return false;
            }
        }
        if self.from.map(|from| e.starts_at < from).unwrap_or(false) {
            return false;
        }
        if self.to.map(|to| e.starts_at > to).unwrap_or(false) {
            return false;
        }
        if self.free && !e.is_free {
            return false;
        }
        if let Some(q) = &self.q {
            if !e.title.to_lowercase().contains(&q.to_lowercase()) {
                return false;
            }
        }
        true
    }

    fn events_query(&self) -> Query {
        let mut q = Query::new().in_list("status", PUBLISHED);
        if let Some(city) = &self.city {
            q = q.ilike("city", city.clone());
        }
        if let Some(category) = &self.category {
            q = q.contains("categories", [category.clone()]);
        }
        if let Some(agent) = &self.agent {
            q = q.or(vec![
                Filter::Eq("venue_id".into(), agent.clone().into()),
                Filter::Eq("organizer_id".into(), agent.clone().into()),
                Filter::Contains("artist_ids".into(), vec![agent.clone().into()]),
            ]);
        }
        if let Some(from) = self.from {
            q = q.gte("starts_at", from.to_rfc3339());
        }
        if let Some(to) = self.to {
            q = q.lte("starts_at", to.to_rfc3339());
        }
        if self.free {
            q = q.eq("is_free", true);
        }
        if let Some(term) = &self.q {
            q = q.ilike("title", format!("%{}%", term));
        }
        q.order("starts_at", true)
    }

    /// Legacy rows have no agents, prices or free flag.
    fn agenda_query(&self) -> Option<Query> {
        if self.agent.is_some() || self.free {
            return None;
        }
        let mut q = Query::new().in_list("status", PUBLISHED);
        if let Some(city) = &self.city {
            q = q.ilike("city", city.clone());
        }
        if let Some(from) = self.from {
            q = q.gte("start_at", from.to_rfc3339());
        }
        if let Some(to) = self.to {
            q = q.lte("start_at", to.to_rfc3339());
        }
        if let Some(term) = &self.q {
            q = q.ilike("title", format!("%{}%", term));
        }
        Some(q.order("start_at", true))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentFilter {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

pub struct Catalog {
    backend: Arc<dyn Backend>,
    cache: ReadCache,
}

impl Catalog {
    pub fn new(backend: Arc<dyn Backend>, cache: ReadCache) -> Self {
        Self { backend, cache }
    }

    pub async fn list_events(&self, filter: EventFilter) -> Result<Page<Event>> {
        let filter = filter.normalized();
        let key = filter.cache_key();
        self.cache
            .get_or_fetch(&key, || async {
                let events: Vec<Event> =
                    fetch(self.backend.as_ref(), event::TABLE, &filter.events_query()).await?;
                let legacy: Vec<AgendaItem> = match filter.agenda_query() {
                    Some(q) => fetch(self.backend.as_ref(), agenda::TABLE, &q).await?,
                    None => Vec::new(),
                };
                let legacy = self.drop_shadowed(legacy).await?;
                let now = crate::time::now_utc();
                let merged: Vec<Event> = agenda::unify(events, legacy)
                    .into_iter()
                    .filter(|e| filter.accepts(e, now))
                    .collect();
                Ok::<_, ServiceError>(paginate(
                    merged,
                    filter.limit.unwrap_or(DEFAULT_LIMIT),
                    filter.offset.unwrap_or(0),
                ))
            })
            .await
    }

    /// Drops legacy items whose slug has a published `events` row, even one
    /// the current filter excluded.
    async fn drop_shadowed(&self, legacy: Vec<AgendaItem>) -> Result<Vec<AgendaItem>> {
        if legacy.is_empty() {
            return Ok(legacy);
        }
        let slugs: Vec<String> = legacy.iter().map(|i| i.slug.clone()).collect();
        let q = Query::new()
            .in_list("slug", slugs)
            .in_list("status", PUBLISHED);
        let shadowing = self.backend.select(event::TABLE, &q).await?;
        let taken: std::collections::HashSet<&str> = shadowing
            .iter()
            .filter_map(|r| r.get("slug").and_then(serde_json::Value::as_str))
            .collect();
        Ok(legacy
            .into_iter()
            .filter(|i| !taken.contains(i.slug.as_str()))
            .collect())
    }

    /// Published event by slug; the legacy agenda is the fallback.
    pub async fn get_event(&self, slug: &str) -> Result<Event> {
        let key = format!("events:slug:{}", slug);
        self.cache
            .get_or_fetch(&key, || async {
                let found: Option<Event> = fetch_one(
                    self.backend.as_ref(),
                    event::TABLE,
                    Query::new().eq("slug", slug).in_list("status", PUBLISHED),
                )
                .await?;
                if let Some(e) = found {
                    return Ok(e);
                }
                let legacy: Option<AgendaItem> = fetch_one(
                    self.backend.as_ref(),
                    agenda::TABLE,
                    Query::new().eq("slug", slug).in_list("status", PUBLISHED),
                )
                .await?;
                legacy
                    .map(Event::from)
                    .ok_or_else(|| ServiceError::not_found(format!("event {}", slug)))
            })
            .await
    }

    /// Published events among `ids`, keyed by id.
    async fn events_by_id(&self, ids: &[String]) -> Result<HashMap<String, Event>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut sorted = ids.to_vec();
        sorted.sort();
        sorted.dedup();
        let key = format!("events:ids:{}", sorted.join(","));
        let events: Vec<Event> = self
            .cache
            .get_or_fetch(&key, || async {
                let q = Query::new()
                    .in_list("id", sorted.clone())
                    .in_list("status", PUBLISHED);
                Ok::<_, ServiceError>(fetch(self.backend.as_ref(), event::TABLE, &q).await?)
            })
            .await?;
        Ok(events.into_iter().map(|e| (e.id.clone(), e)).collect())
    }

    pub async fn list_agents(&self, kind: AgentKind, filter: AgentFilter) -> Result<Page<Agent>> {
        let limit = clamp_limit(filter.limit);
        let offset = filter.offset.unwrap_or(0);
        let city = filter.city.as_deref().and_then(search_term);
        let term = filter.q.as_deref().and_then(search_term);
        let key = format!(
            "agents:{}:list?city={}&q={}&limit={}&offset={}",
            kind,
            city.clone().unwrap_or_default().to_lowercase(),
            term.clone().unwrap_or_default().to_lowercase(),
            limit,
            offset
        );
        self.cache
            .get_or_fetch(&key, || async {
                let mut q = Query::new().order("name", true);
                if let Some(city) = &city {
                    q = q.ilike("city", city.clone());
                }
                if let Some(term) = &term {
                    q = q.ilike("name", format!("%{}%", term));
                }
                let agents = fetch::<Agent>(self.backend.as_ref(), kind.table(), &q)
                    .await?
                    .into_iter()
                    .map(|mut a| {
                        a.kind = kind;
                        a
                    })
                    .collect();
                Ok::<_, ServiceError>(paginate(agents, limit, offset))
            })
            .await
    }

    pub async fn get_agent(&self, kind: AgentKind, slug: &str) -> Result<Agent> {
        let key = format!("agents:{}:slug:{}", kind, slug);
        let mut agent: Agent = self
            .cache
            .get_or_fetch(&key, || async {
                fetch_one::<Agent>(
                    self.backend.as_ref(),
                    kind.table(),
                    Query::new().eq("slug", slug),
                )
                .await?
                .ok_or_else(|| ServiceError::not_found(format!("{} {}", kind, slug)))
            })
            .await?;
        agent.kind = kind;
        Ok(agent)
    }

    /// The agent, its upcoming events and its social counters.
    pub async fn get_agent_profile(&self, kind: AgentKind, slug: &str) -> Result<AgentProfile> {
        let agent = self.get_agent(kind, slug).await?;
        let upcoming = self
            .list_events(EventFilter {
                agent: Some(agent.id.clone()),
                limit: Some(PROFILE_EVENTS),
                ..EventFilter::default()
            })
            .await?;
        let counts = social::load_counts(
            self.backend.as_ref(),
            &self.cache,
            &EntityRef::new(kind.into(), agent.id.clone()),
        )
        .await?;
        Ok(AgentProfile {
            agent,
            upcoming_events: upcoming.items,
            counts,
        })
    }

    /// Live highlights of a placement joined with their published events.
    pub async fn list_highlights(&self, placement: &str) -> Result<Vec<FeaturedEvent>> {
        let placement = placement.trim().to_lowercase();
        let key = format!("highlights:{}", placement);
        let rows: Vec<Highlight> = self
            .cache
            .get_or_fetch(&key, || async {
                let q = Query::new()
                    .eq("placement", placement.as_str())
                    .order("position", true);
                Ok::<_, ServiceError>(fetch(self.backend.as_ref(), highlight::TABLE, &q).await?)
            })
            .await?;

        // Windows are checked on every read; cached rows may straddle a boundary.
        let now = crate::time::now_utc();
        let live: Vec<Highlight> = rows.into_iter().filter(|h| h.is_live(now)).collect();
        let ids: Vec<String> = live.iter().map(|h| h.event_id.clone()).collect();
        let events = self.events_by_id(&ids).await?;

        Ok(live
            .into_iter()
            .filter_map(|h| {
                let event = events.get(&h.event_id).cloned()?;
                Some(FeaturedEvent {
                    highlight_id: h.id,
                    position: h.position,
                    event,
                })
            })
            .collect())
    }

    /// Published revista posts, newest first.
    pub async fn list_posts(&self, page: PageParams) -> Result<Page<RevistaPost>> {
        let limit = clamp_limit(page.limit);
        let offset = page.offset.unwrap_or(0);
        let key = format!("posts:list?limit={}&offset={}", limit, offset);
        self.cache
            .get_or_fetch(&key, || async {
                let q = Query::new()
                    .in_list("status", PUBLISHED)
                    .order("published_at", false)
                    .order("created_at", false);
                let posts = fetch(self.backend.as_ref(), revista::TABLE, &q).await?;
                Ok::<_, ServiceError>(paginate(posts, limit, offset))
            })
            .await
    }

    pub async fn get_post(&self, slug: &str) -> Result<RevistaPost> {
        let key = format!("posts:slug:{}", slug);
        self.cache
            .get_or_fetch(&key, || async {
                fetch_one::<RevistaPost>(
                    self.backend.as_ref(),
                    revista::TABLE,
                    Query::new().eq("slug", slug).in_list("status", PUBLISHED),
                )
                .await?
                .ok_or_else(|| ServiceError::not_found(format!("post {}", slug)))
            })
            .await
    }
}
