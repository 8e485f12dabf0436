use crate::domain::error::Result;
use async_trait::async_trait;

/// Opens a URL through the host's navigation mechanism.
#[async_trait]
pub trait UrlOpener: Send + Sync {
    async fn open_url(&self, url: &str) -> Result<()>;
}
