// Event draft written from the admin console.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::ValidationErrors;
use super::rules::{is_http_url, len_between, trim, trim_list, trim_opt};
use super::Validate;
use crate::model::PublishStatus;
use crate::slug::is_valid_slug;

pub const MAX_CATEGORIES: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
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
}

impl Validate for EventDraft {
    fn normalize(&mut self) {
        trim(&mut self.title);
        trim(&mut self.city);
        trim_opt(&mut self.slug);
        trim_opt(&mut self.description);
        trim_opt(&mut self.venue_id);
        trim_opt(&mut self.venue_name);
        trim_opt(&mut self.organizer_id);
        trim_opt(&mut self.cover_url);
        trim_opt(&mut self.ticket_url);
        trim_list(&mut self.artist_ids);
        trim_list(&mut self.categories);
        for c in self.categories.iter_mut() {
            *c = c.to_lowercase();
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();

        errs.check(
            !len_between(&self.title, 3, 160),
            "title",
            "must be between 3 and 160 characters",
        );
        if let Some(slug) = &self.slug {
            errs.check(!is_valid_slug(slug), "slug", "must be a lowercase slug");
        }
        match (self.starts_at, self.ends_at) {
            (None, _) => errs.add("starts_at", "is required"),
            (Some(start), Some(end)) if end < start => {
                errs.add("ends_at", "must not be before starts_at")
            }
            _ => {}
        }
        errs.check(self.city.is_empty(), "city", "is required");
        errs.check(
            self.categories.len() > MAX_CATEGORIES,
            "categories",
            format!("at most {} categories", MAX_CATEGORIES),
        );
        if let Some(url) = &self.cover_url {
            errs.check(!is_http_url(url), "cover_url", "must be an http(s) URL");
        }
        if let Some(url) = &self.ticket_url {
            errs.check(!is_http_url(url), "ticket_url", "must be an http(s) URL");
        }
        if let Some(price) = self.price_min {
            if !price.is_finite() || price < 0.0 {
                errs.add("price_min", "must be zero or positive");
            } else if self.is_free && price > 0.0 {
                errs.add("price_min", "free events cannot have a price");
            }
        }

        errs.into_result()
    }
}

impl EventDraft {
    /// Row for the `events` table.
    pub fn to_row(&self, slug: &str) -> Value {
        json!({
            "slug": slug,
            "title": self.title,
            "description": self.description,
            "starts_at": self.starts_at,
            "ends_at": self.ends_at,
            "city": self.city,
            "venue_id": self.venue_id,
            "venue_name": self.venue_name,
            "organizer_id": self.organizer_id,
            "artist_ids": self.artist_ids,
            "categories": self.categories,
            "cover_url": self.cover_url,
            "ticket_url": self.ticket_url,
            "price_min": self.price_min,
            "is_free": self.is_free,
            "status": self.status,
        })
    }
}
