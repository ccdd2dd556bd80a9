//! Resolving push targets and delivering with bounded concurrency.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use super::sender::{Delivery, PushSender};
use crate::backend::{fetch, Backend, Query};
use crate::model::social::FOLLOWS_TABLE;
use crate::model::{push, AuthUser, PushSubscription, PushTarget};
use crate::schema::{PushRequest, SubscriptionInput, Validate};
use crate::service::error::{Result, ServiceError};

pub const DEFAULT_CONCURRENCY: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    pub targeted: usize,
    pub delivered: usize,
    pub gone: usize,
    pub failed: usize,
    /// Expired subscriptions removed after a `gone` outcome.
    pub removed: usize,
}

pub struct PushService {
    backend: Arc<dyn Backend>,
    sender: Option<Arc<dyn PushSender>>,
    concurrency: usize,
}

impl PushService {
    /// `sender` is `None` when push delivery is disabled.
    pub fn new(
        backend: Arc<dyn Backend>,
        sender: Option<Arc<dyn PushSender>>,
        concurrency: usize,
    ) -> Self {
        Self {
            backend,
            sender,
            concurrency: concurrency.max(1),
        }
    }

    /// Subscriptions addressed by `target`.
    pub async fn resolve(&self, target: &PushTarget) -> Result<Vec<PushSubscription>> {
        let user_ids: Vec<String> = match target {
            PushTarget::All => {
                return Ok(fetch(self.backend.as_ref(), push::TABLE, &Query::new()).await?);
            }
            PushTarget::Users(ids) => ids.clone(),
            PushTarget::Followers(entity) => {
                let q = Query::new()
                    .eq("entity_type", entity.entity_type.as_str())
                    .eq("entity_id", entity.entity_id.as_str());
                let followers = self.backend.select(FOLLOWS_TABLE, &q).await?;
                followers
                    .iter()
                    .filter_map(|f| f.get("user_id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            }
        };
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let q = Query::new().in_list("user_id", user_ids);
        Ok(fetch(self.backend.as_ref(), push::TABLE, &q).await?)
    }

    pub async fn send(&self, request: PushRequest) -> Result<PushReport> {
        let sender = self.sender.clone().ok_or(ServiceError::PushDisabled)?;
        let request = request.clean()?;
        let payload = request.payload();
        let subscriptions = self.resolve(&request.target).await?;

        let mut report = PushReport {
            targeted: subscriptions.len(),
            ..PushReport::default()
        };

        let outcomes: Vec<(PushSubscription, Delivery)> = stream::iter(subscriptions)
            .map(|sub| {
                let sender = sender.clone();
                let payload = &payload;
                async move {
                    let outcome = sender.deliver(&sub, payload).await;
                    (sub, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut gone_ids = Vec::new();
        for (sub, outcome) in outcomes {
            match outcome {
                Delivery::Delivered => report.delivered += 1,
                Delivery::Gone => {
                    report.gone += 1;
                    gone_ids.push(sub.id);
                }
                Delivery::Failed(reason) => {
                    report.failed += 1;
                    warn!(component = "push", event = "delivery_failed", subscription = %sub.id, reason = %reason, "push delivery failed");
                }
            }
        }

        if !gone_ids.is_empty() {
            report.removed = self
                .backend
                .delete(push::TABLE, &Query::new().in_list("id", gone_ids))
                .await? as usize;
        }

        crate::metrics::add_push_outcomes(
            report.delivered as u64,
            report.gone as u64,
            report.failed as u64,
        );
        info!(
            component = "push",
            event = "fanout_done",
            targeted = report.targeted,
            delivered = report.delivered,
            gone = report.gone,
            failed = report.failed,
            "push fan-out finished"
        );
        Ok(report)
    }

    /// Registers the caller's browser; re-registering an endpoint moves it to the caller.
    pub async fn subscribe(&self, user: &AuthUser, input: SubscriptionInput) -> Result<PushSubscription> {
        let input = input.clean()?;
        let stored = self
            .backend
            .upsert(push::TABLE, input.to_row(&user.id), &["endpoint"])
            .await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Removes one of the caller's subscriptions by endpoint.
    pub async fn unsubscribe(&self, user: &AuthUser, endpoint: &str) -> Result<()> {
        let q = Query::new()
            .eq("user_id", user.id.as_str())
            .eq("endpoint", endpoint);
        let removed = self.backend.delete(push::TABLE, &q).await?;
        if removed == 0 {
            return Err(ServiceError::not_found("subscription"));
        }
        Ok(())
    }
}
