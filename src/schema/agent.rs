// Agent (artist/venue/organizer) draft.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::ValidationErrors;
use super::rules::{char_len, is_http_url, is_instagram_handle, len_between, trim, trim_list, trim_opt};
use super::Validate;
use crate::model::AgentKind;
use crate::slug::is_valid_slug;

pub const MAX_LINKS: usize = 10;
pub const MAX_BIO: usize = 4000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentDraft {
    /// Taken from the route, never from the body.
    #[serde(skip)]
    pub kind: AgentKind,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
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
}

impl Validate for AgentDraft {
    fn normalize(&mut self) {
        trim(&mut self.name);
        trim_opt(&mut self.slug);
        trim_opt(&mut self.bio);
        trim_opt(&mut self.city);
        trim_opt(&mut self.avatar_url);
        trim_opt(&mut self.cover_url);
        trim_list(&mut self.links);
        trim_list(&mut self.tags);
        if let Some(handle) = self.instagram.as_mut() {
            *handle = handle.trim().trim_start_matches('@').to_string();
        }
        trim_opt(&mut self.instagram);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();

        errs.check(
            !len_between(&self.name, 2, 120),
            "name",
            "must be between 2 and 120 characters",
        );
        if let Some(slug) = &self.slug {
            errs.check(!is_valid_slug(slug), "slug", "must be a lowercase slug");
        }
        if let Some(bio) = &self.bio {
            errs.check(
                char_len(bio) > MAX_BIO,
                "bio",
                format!("at most {} characters", MAX_BIO),
            );
        }
        errs.check(
            self.kind == AgentKind::Venue && self.city.is_none(),
            "city",
            "is required for venues",
        );
        errs.check(
            self.links.len() > MAX_LINKS,
            "links",
            format!("at most {} links", MAX_LINKS),
        );
        errs.check(
            self.links.iter().any(|l| !is_http_url(l)),
            "links",
            "must be http(s) URLs",
        );
        for (field, value) in [("avatar_url", &self.avatar_url), ("cover_url", &self.cover_url)] {
            if let Some(url) = value {
                errs.check(!is_http_url(url), field, "must be an http(s) URL");
            }
        }
        if let Some(handle) = &self.instagram {
            errs.check(
                !is_instagram_handle(handle),
                "instagram",
                "must be a valid handle",
            );
        }

        errs.into_result()
    }
}

impl AgentDraft {
    /// Row for the kind's table.
    pub fn to_row(&self, slug: &str) -> Value {
        json!({
            "slug": slug,
            "name": self.name,
            "bio": self.bio,
            "city": self.city,
            "avatar_url": self.avatar_url,
            "cover_url": self.cover_url,
            "links": self.links,
            "tags": self.tags,
            "instagram": self.instagram,
        })
    }
}
