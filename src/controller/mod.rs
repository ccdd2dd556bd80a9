// HTTP API controllers.

pub mod agents;
pub mod config;
pub mod controller;
pub mod curation;
pub mod events;
pub mod forms;
pub mod highlights;
pub mod metrics;
pub mod orphans;
pub mod probe;
pub mod push;
pub mod request;
pub mod revista;
pub mod social;

// Re-export controller types for convenience
pub use agents::AgentsController;
pub use config::ShowConfigController;
pub use curation::CurationController;
pub use events::EventsController;
pub use forms::FormsController;
pub use highlights::HighlightsController;
pub use metrics::PrometheusMetricsController;
pub use orphans::OrphansController;
pub use probe::LivenessProbeController;
pub use push::PushController;
pub use revista::RevistaController;
pub use social::SocialController;
