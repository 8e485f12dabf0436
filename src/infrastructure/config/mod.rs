use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PREVIEW_ENDPOINT: &str = "hal.testandtarget.omniture.com";
pub const ENV_PREFIX: &str = "TARGET_PREVIEW_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PreviewConfig {
    /// Target client code, part of the preview web-view path.
    pub client_code: String,
    pub default_endpoint: String,
    pub preview_enabled: bool,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            client_code: String::new(),
            default_endpoint: DEFAULT_PREVIEW_ENDPOINT.to_string(),
            preview_enabled: true,
            connect_timeout_secs: 5,
            read_timeout_secs: 5,
        }
    }
}

impl PreviewConfig {
    pub fn with_client_code(client_code: impl Into<String>) -> Self {
        Self {
            client_code: client_code.into(),
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Checks whether preview mode may be entered with this configuration.
    pub fn ensure_preview_allowed(&self) -> Result<()> {
        if !self.preview_enabled {
            return Err(AppError::ConfigError(
                "Preview mode is disabled in configuration.".to_string(),
            ));
        }
        if self.client_code.trim().is_empty() {
            return Err(AppError::ConfigError(
                "Client code is not configured.".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct ConfigService {
    figment: Figment,
}

impl ConfigService {
    /// Defaults overridden by `TARGET_PREVIEW_*` environment variables.
    pub fn new() -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(PreviewConfig::default()))
                .merge(Env::prefixed(ENV_PREFIX)),
        }
    }

    /// Defaults, then the TOML file, then the environment.
    pub fn with_file(path: impl AsRef<Path>) -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(PreviewConfig::default()))
                .merge(Toml::file(path.as_ref()))
                .merge(Env::prefixed(ENV_PREFIX)),
        }
    }

    pub fn load(&self) -> Result<PreviewConfig> {
        let config: PreviewConfig = self.figment.extract()?;
        if config.default_endpoint.trim().is_empty() {
            return Err(AppError::ConfigError(
                "default_endpoint must not be empty".to_string(),
            ));
        }
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
