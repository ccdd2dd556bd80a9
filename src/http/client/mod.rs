//! Outbound HTTP: pooled hyper client and a single request helper.

pub mod hyper_client;
pub mod request;

pub use hyper_client::{create_client, HyperClient};
pub use request::{send, Reply};
