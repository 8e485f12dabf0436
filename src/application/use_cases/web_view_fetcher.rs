use crate::infrastructure::config::PreviewConfig;
use crate::infrastructure::http::{NetworkRequest, NetworkService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct WebViewFetcher {
    network: Arc<dyn NetworkService>,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl WebViewFetcher {
    pub fn new(network: Arc<dyn NetworkService>, config: &PreviewConfig) -> Self {
        Self {
            network,
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
        }
    }

    /// Fetches the preview web view. Every failure collapses to `None`; preview
    /// mode is a manual aid and the user can simply follow the link again.
    pub async fn fetch(&self, request_url: &str) -> Option<String> {
        let request = NetworkRequest::get(request_url, self.connect_timeout, self.read_timeout)
            .with_header("Accept", "text/html");

        let response = match self.network.get(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, url = request_url, "Failed to fetch preview web view");
                return None;
            }
        };

        if !response.is_success() {
            warn!(
                status = response.status,
                url = request_url,
                "Preview web view request was rejected"
            );
            return None;
        }
        if response.body.trim().is_empty() {
            debug!(url = request_url, "Preview web view response was empty");
            return None;
        }
        Some(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::memory::MemoryNetworkService;

    const URL: &str = "https://hal.testandtarget.omniture.com/ui/admin/acme/preview?token=abcd";

    fn fetcher(network: Arc<MemoryNetworkService>) -> WebViewFetcher {
        WebViewFetcher::new(network, &PreviewConfig::with_client_code("acme"))
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_sends_timeouts() {
        let network = Arc::new(MemoryNetworkService::responding(200, "<html>preview</html>"));
        let body = fetcher(network.clone()).fetch(URL).await;

        assert_eq!(body.as_deref(), Some("<html>preview</html>"));
        let requests = network.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, URL);
        assert_eq!(requests[0].connect_timeout, Duration::from_secs(5));
        assert_eq!(requests[0].read_timeout, Duration::from_secs(5));
        assert!(requests[0]
            .headers
            .contains(&("Accept".to_string(), "text/html".to_string())));
    }

    #[tokio::test]
    async fn test_fetch_failures_are_absorbed() {
        let failing = Arc::new(MemoryNetworkService::failing("timed out"));
        assert!(fetcher(failing).fetch(URL).await.is_none());

        let rejected = Arc::new(MemoryNetworkService::responding(500, "<html>oops</html>"));
        assert!(fetcher(rejected).fetch(URL).await.is_none());

        let empty = Arc::new(MemoryNetworkService::responding(200, "  \n"));
        assert!(fetcher(empty).fetch(URL).await.is_none());
    }
}
