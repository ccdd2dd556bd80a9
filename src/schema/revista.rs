// Revista post draft.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::ValidationErrors;
use super::rules::{char_len, is_http_url, len_between, trim, trim_list, trim_opt};
use super::Validate;
use crate::slug::is_valid_slug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevistaPostDraft {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Validate for RevistaPostDraft {
    fn normalize(&mut self) {
        trim(&mut self.title);
        trim_opt(&mut self.slug);
        trim_opt(&mut self.excerpt);
        trim_opt(&mut self.cover_url);
        trim_opt(&mut self.author);
        trim_list(&mut self.tags);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();
        errs.check(
            !len_between(&self.title, 3, 200),
            "title",
            "must be between 3 and 200 characters",
        );
        if let Some(slug) = &self.slug {
            errs.check(!is_valid_slug(slug), "slug", "must be a lowercase slug");
        }
        errs.check(self.body.trim().is_empty(), "body", "is required");
        if let Some(excerpt) = &self.excerpt {
            errs.check(char_len(excerpt) > 400, "excerpt", "at most 400 characters");
        }
        if let Some(url) = &self.cover_url {
            errs.check(!is_http_url(url), "cover_url", "must be an http(s) URL");
        }
        errs.into_result()
    }
}

impl RevistaPostDraft {
    /// Row for `revista_posts`; editorial status is managed separately.
    pub fn to_row(&self, slug: &str) -> Value {
        json!({
            "slug": slug,
            "title": self.title,
            "excerpt": self.excerpt,
            "body": self.body,
            "cover_url": self.cover_url,
            "author": self.author,
            "tags": self.tags,
        })
    }
}
