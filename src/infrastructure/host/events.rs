use crate::domain::error::Result;
use crate::domain::target_event::TargetEvent;
use async_trait::async_trait;

/// Host event bus.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, event: TargetEvent) -> Result<()>;
}
