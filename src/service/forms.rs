//! Public form intake: newsletter sign-ups and job applications.
//!
//! Each handler runs rate limit, then validation, then the write.

use std::sync::Arc;
use tracing::{info, warn};

use super::error::{Result, ServiceError};
use crate::backend::Backend;
use crate::config::{Config, ConfigTrait};
use crate::model::forms::{JOB_APPLICATIONS_TABLE, NEWSLETTER_TABLE};
use crate::rate::Limiter;
use crate::schema::{JobApplicationForm, NewsletterForm, Validate};

pub const NEWSLETTER: &str = "newsletter";
pub const JOB_APPLICATION: &str = "job_application";

pub struct Forms {
    backend: Arc<dyn Backend>,
    newsletter: Arc<Limiter>,
    job_application: Arc<Limiter>,
}

impl Forms {
    pub fn new(backend: Arc<dyn Backend>, newsletter: Arc<Limiter>, job_application: Arc<Limiter>) -> Self {
        Self {
            backend,
            newsletter,
            job_application,
        }
    }

    /// Builds both limiters from `forms.*` settings.
    pub fn from_config(backend: Arc<dyn Backend>, cfg: &Config) -> Self {
        let nl = cfg.newsletter_limit();
        let ja = cfg.job_application_limit();
        Self::new(
            backend,
            Arc::new(Limiter::new(NEWSLETTER, nl.requests, nl.window)),
            Arc::new(Limiter::new(JOB_APPLICATION, ja.requests, ja.window)),
        )
    }

    pub fn limiters(&self) -> [&Arc<Limiter>; 2] {
        [&self.newsletter, &self.job_application]
    }

    fn admit(limiter: &Limiter, form: &'static str, client: &str) -> Result<()> {
        limiter.check(client).map_err(|exceeded| {
            crate::metrics::inc_form_rate_limited(form);
            warn!(component = "forms", event = "rate_limited", form, client, "form rate limited");
            ServiceError::RateLimited {
                retry_after: exceeded.retry_after,
            }
        })
    }

    /// Spends one newsletter request for bodies rejected before validation.
    pub fn admit_newsletter(&self, client: &str) -> Result<()> {
        Self::admit(&self.newsletter, NEWSLETTER, client)
    }

    pub fn admit_job_application(&self, client: &str) -> Result<()> {
        Self::admit(&self.job_application, JOB_APPLICATION, client)
    }

    fn clean<T: Validate>(form: &'static str, payload: T) -> Result<T> {
        payload.clean().map_err(|errs| {
            crate::metrics::inc_form_rejected(form);
            ServiceError::Validation(errs)
        })
    }

    /// Subscribing an address that is already subscribed succeeds.
    pub async fn subscribe_newsletter(&self, client: &str, form: NewsletterForm) -> Result<()> {
        Self::admit(&self.newsletter, NEWSLETTER, client)?;
        let form = Self::clean(NEWSLETTER, form)?;
        self.backend
            .upsert(NEWSLETTER_TABLE, form.to_row(), &["email"])
            .await?;
        crate::metrics::inc_form_accepted(NEWSLETTER);
        info!(component = "forms", event = "newsletter_subscribed", client, "newsletter subscription stored");
        Ok(())
    }

    /// Stores an application and returns its id.
    pub async fn submit_job_application(&self, client: &str, form: JobApplicationForm) -> Result<String> {
        Self::admit(&self.job_application, JOB_APPLICATION, client)?;
        let form = Self::clean(JOB_APPLICATION, form)?;
        let stored = self
            .backend
            .insert(JOB_APPLICATIONS_TABLE, form.to_row())
            .await?;
        let id = stored
            .get("id")
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default();
        crate::metrics::inc_form_accepted(JOB_APPLICATION);
        info!(component = "forms", event = "job_application_received", client, id = %id, "job application stored");
        Ok(id)
    }
}
