//! ROLÊ platform service: public catalog reads, social interactions, admin
//! curation and the serverless handlers (forms, push fan-out, storage
//! orphans) over a hosted backend.

#[path = "k8s/probe/liveness/mod.rs"]
pub mod liveness;
#[path = "shared/rate/mod.rs"]
pub mod rate;
#[path = "shared/slug/mod.rs"]
pub mod slug;
#[path = "shared/time/mod.rs"]
pub mod time;
#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub mod app;
pub mod backend;
pub mod cache;
pub mod config;
pub mod controller;
pub mod http;
pub mod metrics;
pub mod middleware;
pub mod model;
pub mod schema;
pub mod service;
pub mod shutdown;
