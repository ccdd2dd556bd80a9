//! Prometheus metrics functionality.
//
//! Metrics organization:
//! - Service metrics: metrics::meter (cache hits, form intake, push fan-out, orphans)
//! - Process metrics: metrics-process (process_resident_memory_bytes, process_cpu_*, etc.)

pub mod meter;

pub use meter::*;
