// Service trait for liveness checking

use async_trait::async_trait;

/// Something the liveness probe asks whether it is still working.
#[async_trait]
pub trait Service: Send + Sync {
    /// Short name used in probe logs.
    fn name(&self) -> &'static str;

    /// Checks if the service is alive.
    async fn is_alive(&self) -> bool;
}
