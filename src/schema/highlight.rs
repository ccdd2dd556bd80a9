// Highlight draft.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::ValidationErrors;
use super::rules::trim;
use super::Validate;
use crate::slug::is_valid_slug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightDraft {
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub placement: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Validate for HighlightDraft {
    fn normalize(&mut self) {
        trim(&mut self.event_id);
        self.placement = self.placement.trim().to_lowercase();
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();
        errs.check(self.event_id.is_empty(), "event_id", "is required");
        errs.check(
            !is_valid_slug(&self.placement),
            "placement",
            "must be a lowercase slug",
        );
        errs.check(self.position < 0, "position", "must be zero or positive");
        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at) {
            errs.check(end < start, "ends_at", "must not be before starts_at");
        }
        errs.into_result()
    }
}

impl HighlightDraft {
    pub fn to_row(&self) -> Value {
        json!({
            "event_id": self.event_id,
            "placement": self.placement,
            "position": self.position,
            "starts_at": self.starts_at,
            "ends_at": self.ends_at,
            "active": self.active,
        })
    }
}
