//! Admin writes: events, agents, highlights and revista posts.
//!
//! Callers are expected to be authenticated admins; every write drops the
//! cache prefixes whose reads it can change.

use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::error::{Result, ServiceError};
use super::read_cache::ReadCache;
use crate::backend::{fetch, fetch_one, Backend, Query};
use crate::model::{event, highlight, revista, Agent, AgentKind, Event, Highlight, RevistaPost};
use crate::schema::{AgentDraft, EventDraft, HighlightDraft, RevistaPostDraft, Validate, ValidationErrors};
use crate::slug::{slugify, unique_slug};

const EVENTS_PREFIXES: [&str; 3] = ["events:", "highlights:", "agents:"];

pub struct Curation {
    backend: Arc<dyn Backend>,
    cache: ReadCache,
}

fn slug_error(message: &str) -> ServiceError {
    let mut errs = ValidationErrors::new();
    errs.add("slug", message);
    ServiceError::Validation(errs)
}

fn first<T: serde::de::DeserializeOwned>(rows: Vec<Value>, what: String) -> Result<T> {
    let row = rows
        .into_iter()
        .next()
        .ok_or(ServiceError::NotFound(what))?;
    Ok(serde_json::from_value(row)?)
}

impl Curation {
    pub fn new(backend: Arc<dyn Backend>, cache: ReadCache) -> Self {
        Self { backend, cache }
    }

    /// Picks the slug for a record in `table`.
    ///
    /// An explicit slug must be free; a derived one gets a numeric suffix
    /// until it is. `exclude_id` is the record being updated.
    async fn resolve_slug(
        &self,
        table: &str,
        explicit: Option<&str>,
        source: &str,
        exclude_id: Option<&str>,
    ) -> Result<String> {
        let base = match explicit {
            Some(s) => s.to_string(),
            None => slugify(source),
        };
        if base.is_empty() {
            return Err(slug_error("could not derive a slug"));
        }

        let rows = self
            .backend
            .select(table, &Query::new().ilike("slug", format!("{}%", base)))
            .await?;
        let taken: HashSet<String> = rows
            .iter()
            .filter(|r| exclude_id.is_none() || r.get("id").and_then(Value::as_str) != exclude_id)
            .filter_map(|r| r.get("slug").and_then(Value::as_str).map(str::to_string))
            .collect();

        if explicit.is_some() {
            if taken.contains(&base) {
                return Err(slug_error("is already taken"));
            }
            return Ok(base);
        }
        Ok(unique_slug(&base, |s| taken.contains(s)))
    }

    async fn current_slug(&self, table: &str, id: &str) -> Result<String> {
        let row = self
            .backend
            .select(table, &Query::new().eq("id", id).limit(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::not_found(format!("{} {}", table, id)))?;
        Ok(row
            .get("slug")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    // Events

    pub async fn create_event(&self, draft: EventDraft) -> Result<Event> {
        let draft = draft.clean()?;
        let slug = self
            .resolve_slug(event::TABLE, draft.slug.as_deref(), &draft.title, None)
            .await?;
        let stored = self.backend.insert(event::TABLE, draft.to_row(&slug)).await?;
        self.cache.invalidate(&EVENTS_PREFIXES);
        let event: Event = serde_json::from_value(stored)?;
        info!(component = "curation", event = "event_created", id = %event.id, slug = %event.slug, "event created");
        Ok(event)
    }

    pub async fn update_event(&self, id: &str, draft: EventDraft) -> Result<Event> {
        let draft = draft.clean()?;
        let slug = match draft.slug.as_deref() {
            Some(s) => self.resolve_slug(event::TABLE, Some(s), "", Some(id)).await?,
            None => self.current_slug(event::TABLE, id).await?,
        };
        let rows = self
            .backend
            .update(event::TABLE, &Query::new().eq("id", id), draft.to_row(&slug))
            .await?;
        self.cache.invalidate(&EVENTS_PREFIXES);
        first(rows, format!("event {}", id))
    }

    pub async fn delete_event(&self, id: &str) -> Result<()> {
        let removed = self
            .backend
            .delete(event::TABLE, &Query::new().eq("id", id))
            .await?;
        if removed == 0 {
            return Err(ServiceError::not_found(format!("event {}", id)));
        }
        self.cache.invalidate(&EVENTS_PREFIXES);
        info!(component = "curation", event = "event_deleted", id, "event deleted");
        Ok(())
    }

    // Agents

    pub async fn create_agent(&self, kind: AgentKind, mut draft: AgentDraft) -> Result<Agent> {
        draft.kind = kind;
        let draft = draft.clean()?;
        let slug = self
            .resolve_slug(kind.table(), draft.slug.as_deref(), &draft.name, None)
            .await?;
        let stored = self.backend.insert(kind.table(), draft.to_row(&slug)).await?;
        self.invalidate_agents(kind);
        let mut agent: Agent = serde_json::from_value(stored)?;
        agent.kind = kind;
        info!(component = "curation", event = "agent_created", kind = %kind, id = %agent.id, "agent created");
        Ok(agent)
    }

    pub async fn update_agent(
        &self,
        kind: AgentKind,
        id: &str,
        mut draft: AgentDraft,
    ) -> Result<Agent> {
        draft.kind = kind;
        let draft = draft.clean()?;
        let slug = match draft.slug.as_deref() {
            Some(s) => self.resolve_slug(kind.table(), Some(s), "", Some(id)).await?,
            None => self.current_slug(kind.table(), id).await?,
        };
        let rows = self
            .backend
            .update(kind.table(), &Query::new().eq("id", id), draft.to_row(&slug))
            .await?;
        self.invalidate_agents(kind);
        let mut agent: Agent = first(rows, format!("{} {}", kind, id))?;
        agent.kind = kind;
        Ok(agent)
    }

    pub async fn delete_agent(&self, kind: AgentKind, id: &str) -> Result<()> {
        let removed = self
            .backend
            .delete(kind.table(), &Query::new().eq("id", id))
            .await?;
        if removed == 0 {
            return Err(ServiceError::not_found(format!("{} {}", kind, id)));
        }
        self.invalidate_agents(kind);
        info!(component = "curation", event = "agent_deleted", kind = %kind, id, "agent deleted");
        Ok(())
    }

    fn invalidate_agents(&self, kind: AgentKind) {
        let prefix = format!("agents:{}:", kind);
        self.cache.invalidate(&[prefix.as_str()]);
    }

    // Highlights

    async fn ensure_event_exists(&self, event_id: &str) -> Result<()> {
        let found: Option<Value> = fetch_one(
            self.backend.as_ref(),
            event::TABLE,
            Query::new().eq("id", event_id),
        )
        .await?;
        if found.is_none() {
            let mut errs = ValidationErrors::new();
            errs.add("event_id", "unknown event");
            return Err(errs.into());
        }
        Ok(())
    }

    /// Every highlight of a placement, live or not, in display order.
    pub async fn list_highlights(&self, placement: &str) -> Result<Vec<Highlight>> {
        let q = Query::new()
            .eq("placement", placement.trim().to_lowercase())
            .order("position", true);
        Ok(fetch(self.backend.as_ref(), highlight::TABLE, &q).await?)
    }

    pub async fn create_highlight(&self, draft: HighlightDraft) -> Result<Highlight> {
        let draft = draft.clean()?;
        self.ensure_event_exists(&draft.event_id).await?;
        let stored = self.backend.insert(highlight::TABLE, draft.to_row()).await?;
        self.cache.invalidate(&["highlights:"]);
        Ok(serde_json::from_value(stored)?)
    }

    pub async fn update_highlight(&self, id: &str, draft: HighlightDraft) -> Result<Highlight> {
        let draft = draft.clean()?;
        self.ensure_event_exists(&draft.event_id).await?;
        let rows = self
            .backend
            .update(highlight::TABLE, &Query::new().eq("id", id), draft.to_row())
            .await?;
        self.cache.invalidate(&["highlights:"]);
        first(rows, format!("highlight {}", id))
    }

    pub async fn delete_highlight(&self, id: &str) -> Result<()> {
        let removed = self
            .backend
            .delete(highlight::TABLE, &Query::new().eq("id", id))
            .await?;
        if removed == 0 {
            return Err(ServiceError::not_found(format!("highlight {}", id)));
        }
        self.cache.invalidate(&["highlights:"]);
        Ok(())
    }

    /// Assigns positions `0..n` in the order of `ids`, which must list every
    /// highlight of the placement exactly once.
    pub async fn reorder_highlights(&self, placement: &str, ids: &[String]) -> Result<Vec<Highlight>> {
        let current = self.list_highlights(placement).await?;
        let known: HashSet<&str> = current.iter().map(|h| h.id.as_str()).collect();
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        if wanted.len() != ids.len() {
            return Err(ServiceError::BadRequest("duplicate highlight ids".to_string()));
        }
        if wanted != known {
            return Err(ServiceError::BadRequest(format!(
                "ids must list every highlight of placement {:?}",
                placement
            )));
        }

        for (position, id) in ids.iter().enumerate() {
            self.backend
                .update(
                    highlight::TABLE,
                    &Query::new().eq("id", id.as_str()),
                    json!({ "position": position }),
                )
                .await?;
        }
        self.cache.invalidate(&["highlights:"]);
        info!(component = "curation", event = "highlights_reordered", placement, count = ids.len(), "highlights reordered");
        self.list_highlights(placement).await
    }

    // Revista

    /// Every post regardless of status, newest first.
    pub async fn list_posts(&self) -> Result<Vec<RevistaPost>> {
        let q = Query::new().order("created_at", false);
        Ok(fetch(self.backend.as_ref(), revista::TABLE, &q).await?)
    }

    pub async fn create_post(&self, draft: RevistaPostDraft) -> Result<RevistaPost> {
        let draft = draft.clean()?;
        let slug = self
            .resolve_slug(revista::TABLE, draft.slug.as_deref(), &draft.title, None)
            .await?;
        let mut row = draft.to_row(&slug);
        row["status"] = json!("draft");
        let stored = self.backend.insert(revista::TABLE, row).await?;
        self.cache.invalidate(&["posts:"]);
        Ok(serde_json::from_value(stored)?)
    }

    pub async fn update_post(&self, id: &str, draft: RevistaPostDraft) -> Result<RevistaPost> {
        let draft = draft.clean()?;
        let slug = match draft.slug.as_deref() {
            Some(s) => self.resolve_slug(revista::TABLE, Some(s), "", Some(id)).await?,
            None => self.current_slug(revista::TABLE, id).await?,
        };
        let rows = self
            .backend
            .update(revista::TABLE, &Query::new().eq("id", id), draft.to_row(&slug))
            .await?;
        self.cache.invalidate(&["posts:"]);
        first(rows, format!("post {}", id))
    }

    /// Publishing stamps `published_at` only the first time.
    pub async fn publish_post(&self, id: &str) -> Result<RevistaPost> {
        let post: RevistaPost = fetch_one(
            self.backend.as_ref(),
            revista::TABLE,
            Query::new().eq("id", id),
        )
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("post {}", id)))?;

        let published_at = post.published_at.unwrap_or_else(crate::time::now_utc);
        let rows = self
            .backend
            .update(
                revista::TABLE,
                &Query::new().eq("id", id),
                json!({"status": "published", "published_at": published_at}),
            )
            .await?;
        self.cache.invalidate(&["posts:"]);
        info!(component = "curation", event = "post_published", id, "post published");
        first(rows, format!("post {}", id))
    }

    pub async fn unpublish_post(&self, id: &str) -> Result<RevistaPost> {
        let rows = self
            .backend
            .update(
                revista::TABLE,
                &Query::new().eq("id", id),
                json!({"status": "draft"}),
            )
            .await?;
        self.cache.invalidate(&["posts:"]);
        first(rows, format!("post {}", id))
    }

    pub async fn delete_post(&self, id: &str) -> Result<()> {
        let removed = self
            .backend
            .delete(revista::TABLE, &Query::new().eq("id", id))
            .await?;
        if removed == 0 {
            return Err(ServiceError::not_found(format!("post {}", id)));
        }
        self.cache.invalidate(&["posts:"]);
        Ok(())
    }
}
