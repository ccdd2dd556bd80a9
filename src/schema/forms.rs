// Public form payloads.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::ValidationErrors;
use super::rules::{char_len, is_email, is_http_url, is_phone, len_between, trim, trim_opt};
use super::Validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsletterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl Validate for NewsletterForm {
    fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
        trim_opt(&mut self.name);
        trim_opt(&mut self.source);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();
        errs.check(!is_email(&self.email), "email", "must be a valid email");
        if let Some(name) = &self.name {
            errs.check(char_len(name) > 120, "name", "at most 120 characters");
        }
        if let Some(source) = &self.source {
            errs.check(char_len(source) > 60, "source", "at most 60 characters");
        }
        errs.into_result()
    }
}

impl NewsletterForm {
    pub fn to_row(&self) -> Value {
        json!({
            "email": self.email,
            "name": self.name,
            "source": self.source,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobApplicationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl Validate for JobApplicationForm {
    fn normalize(&mut self) {
        trim(&mut self.name);
        self.email = self.email.trim().to_lowercase();
        trim_opt(&mut self.phone);
        trim(&mut self.position);
        trim_opt(&mut self.portfolio_url);
        trim(&mut self.message);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();
        errs.check(
            !len_between(&self.name, 2, 120),
            "name",
            "must be between 2 and 120 characters",
        );
        errs.check(!is_email(&self.email), "email", "must be a valid email");
        if let Some(phone) = &self.phone {
            errs.check(!is_phone(phone), "phone", "must be a valid phone number");
        }
        errs.check(
            !len_between(&self.position, 1, 120),
            "position",
            "is required (at most 120 characters)",
        );
        if let Some(url) = &self.portfolio_url {
            errs.check(!is_http_url(url), "portfolio_url", "must be an http(s) URL");
        }
        errs.check(
            !len_between(&self.message, 20, 5000),
            "message",
            "must be between 20 and 5000 characters",
        );
        errs.into_result()
    }
}

impl JobApplicationForm {
    pub fn to_row(&self) -> Value {
        json!({
            "name": self.name,
            "email": self.email,
            "phone": self.phone,
            "position": self.position,
            "portfolio_url": self.portfolio_url,
            "message": self.message,
        })
    }
}
