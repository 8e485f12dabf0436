pub mod memory;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::PreviewConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl NetworkRequest {
    pub fn get(url: impl Into<String>, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            connect_timeout,
            read_timeout,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkResponse {
    pub status: u16,
    pub body: String,
}

impl NetworkResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network capability supplied by the host.
#[async_trait]
pub trait NetworkService: Send + Sync {
    async fn get(&self, request: &NetworkRequest) -> Result<NetworkResponse>;
}

pub struct ReqwestNetworkService {
    client: Client,
}

impl ReqwestNetworkService {
    pub fn new() -> Self {
        let defaults = PreviewConfig::default();
        Self {
            client: Client::builder()
                .connect_timeout(defaults.connect_timeout())
                .read_timeout(defaults.read_timeout())
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn with_config(config: &PreviewConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Default for ReqwestNetworkService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkService for ReqwestNetworkService {
    async fn get(&self, request: &NetworkRequest) -> Result<NetworkResponse> {
        // Connect and read phases are bounded by the client; this caps the whole exchange.
        let mut builder = self
            .client
            .get(&request.url)
            .timeout(request.connect_timeout + request.read_timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(NetworkResponse { status, body })
    }
}
