// Push fan-out requests and browser subscriptions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::ValidationErrors;
use super::rules::{char_len, is_http_url, len_between, trim, trim_opt};
use super::Validate;
use crate::model::{PushPayload, PushTarget};

pub const MAX_TITLE: usize = 120;
pub const MAX_BODY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
    pub target: PushTarget,
}

impl Validate for PushRequest {
    fn normalize(&mut self) {
        trim(&mut self.title);
        trim(&mut self.body);
        trim_opt(&mut self.url);
        if let PushTarget::Users(ids) = &mut self.target {
            super::rules::trim_list(ids);
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();
        errs.check(
            !len_between(&self.title, 1, MAX_TITLE),
            "title",
            format!("must be between 1 and {} characters", MAX_TITLE),
        );
        errs.check(
            !len_between(&self.body, 1, MAX_BODY),
            "body",
            format!("must be between 1 and {} characters", MAX_BODY),
        );
        if let Some(url) = &self.url {
            // Relative links open inside the app.
            errs.check(
                !(url.starts_with('/') || is_http_url(url)),
                "url",
                "must be an app path or an http(s) URL",
            );
        }
        if let PushTarget::Users(ids) = &self.target {
            errs.check(ids.is_empty(), "target", "users must not be empty");
        }
        errs.into_result()
    }
}

impl PushRequest {
    pub fn payload(&self) -> PushPayload {
        PushPayload {
            title: self.title.clone(),
            body: self.body.clone(),
            url: self.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    #[serde(default)]
    pub p256dh: String,
    #[serde(default)]
    pub auth: String,
}

/// A browser `PushSubscription` as serialized by `toJSON()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionInput {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub keys: SubscriptionKeys,
}

impl Validate for SubscriptionInput {
    fn normalize(&mut self) {
        trim(&mut self.endpoint);
        trim(&mut self.keys.p256dh);
        trim(&mut self.keys.auth);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errs = ValidationErrors::new();
        errs.check(
            !self.endpoint.starts_with("https://") || !is_http_url(&self.endpoint),
            "endpoint",
            "must be an https URL",
        );
        errs.check(
            self.keys.p256dh.is_empty() || char_len(&self.keys.p256dh) > 256,
            "keys.p256dh",
            "is required",
        );
        errs.check(
            self.keys.auth.is_empty() || char_len(&self.keys.auth) > 256,
            "keys.auth",
            "is required",
        );
        errs.into_result()
    }
}

impl SubscriptionInput {
    pub fn to_row(&self, user_id: &str) -> Value {
        json!({
            "user_id": user_id,
            "endpoint": self.endpoint,
            "p256dh": self.keys.p256dh,
            "auth": self.keys.auth,
        })
    }
}
