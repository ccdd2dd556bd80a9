// Review and comment inputs.

use serde::{Deserialize, Serialize};

use super::errors::ValidationErrors;
use super::rules::{char_len, trim, trim_opt};
use super::Validate;

pub const MAX_TEXT: usize = 2000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewInput {
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Validate for ReviewInput {
    fn normalize(&mut self) {
        trim_opt(&mut self.comment);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();
        errs.check(
            !(1..=5).contains(&self.rating),
            "rating",
            "must be between 1 and 5",
        );
        if let Some(comment) = &self.comment {
            errs.check(
                char_len(comment) > MAX_TEXT,
                "comment",
                format!("at most {} characters", MAX_TEXT),
            );
        }
        errs.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    pub body: String,
}

impl Validate for CommentInput {
    fn normalize(&mut self) {
        trim(&mut self.body);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();
        errs.check(
            self.body.is_empty() || char_len(&self.body) > MAX_TEXT,
            "body",
            format!("must be between 1 and {} characters", MAX_TEXT),
        );
        errs.into_result()
    }
}
