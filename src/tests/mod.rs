//! End-to-end tests for the ROLÊ service.
//!
//! Each case boots a real server over the in-memory backend and talks to it
//! over HTTP.

mod cases_admin_curation_test;
mod cases_service_endpoints_test;
mod cases_storage_orphans_test;

pub mod support;
