//! Web-push fan-out.

pub mod fanout;
pub mod sender;


pub use fanout::{PushReport, PushService, DEFAULT_CONCURRENCY};
pub use sender::{classify, Delivery, PushSender, RelayPushSender};

use anyhow::Result;
use std::sync::Arc;

use crate::backend::Backend;
use crate::config::{Config, ConfigTrait};

/// Builds the service from `push.*`; without `push.enabled` sends are refused.
pub fn from_config(backend: Arc<dyn Backend>, cfg: &Config) -> Result<PushService> {
    let Some(push) = cfg.push().filter(|p| p.enabled) else {
        return Ok(PushService::new(backend, None, DEFAULT_CONCURRENCY));
    };
    let url = push
        .relay_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("push.relay_url is required when push is enabled"))?;
    let sender = RelayPushSender::new(url, push.relay_token.clone(), push.timeout, push.message_ttl)?;
    Ok(PushService::new(
        backend,
        Some(Arc::new(sender)),
        push.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
    ))
}
