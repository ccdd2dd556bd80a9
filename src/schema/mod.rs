//! Validation schemas for everything the service writes on behalf of users.
//!
//! Each draft type normalizes itself (trimming, lowercasing, stripping
//! decorations) and then reports every invalid field at once.

pub mod agent;
pub mod errors;
pub mod event;
pub mod forms;
pub mod highlight;
pub mod push;
pub mod revista;
pub mod rules;
pub mod social;


pub use agent::AgentDraft;
pub use errors::ValidationErrors;
pub use event::EventDraft;
pub use forms::{JobApplicationForm, NewsletterForm};
pub use highlight::HighlightDraft;
pub use push::{PushRequest, SubscriptionInput, SubscriptionKeys};
pub use revista::RevistaPostDraft;
pub use social::{CommentInput, ReviewInput};

/// A payload that can check itself.
pub trait Validate {
    /// Trims and canonicalizes fields before validation.
    fn normalize(&mut self) {}

    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Normalizes, then validates.
    fn clean(mut self) -> Result<Self, ValidationErrors>
    where
        Self: Sized,
    {
        self.normalize();
        self.validate()?;
        Ok(self)
    }
}
