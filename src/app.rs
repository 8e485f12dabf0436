use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::application::PreviewManager;
use crate::domain::error::{AppError, Result};
use crate::domain::preview_session::PreviewSnapshot;
use crate::domain::target_event::TargetEvent;
use crate::infrastructure::config::{ConfigService, PreviewConfig};
use crate::infrastructure::host::{MemoryEventDispatcher, MemoryUrlOpener, TracingUiDelegate};
use crate::infrastructure::http::{NetworkService, ReqwestNetworkService};

/// Optional TOML file layered under the `TARGET_PREVIEW_*` variables.
pub const CONFIG_PATH_ENV: &str = "TARGET_PREVIEW_CONFIG";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[derive(Debug, Clone)]
pub struct HarnessReport {
    pub entered: bool,
    pub callback_handled: Option<bool>,
    pub events: Vec<TargetEvent>,
    pub opened_urls: Vec<String>,
    pub snapshot: PreviewSnapshot,
}

/// Drives one preview session headlessly: enter from `deep_link`, then feed
/// `callback_url` if given.
pub async fn run_harness(
    config: PreviewConfig,
    network: Arc<dyn NetworkService>,
    deep_link: &str,
    callback_url: Option<&str>,
) -> Result<HarnessReport> {
    config.ensure_preview_allowed()?;

    let events = Arc::new(MemoryEventDispatcher::default());
    let opener = Arc::new(MemoryUrlOpener::default());
    let manager = PreviewManager::new(
        config,
        network,
        Arc::new(TracingUiDelegate),
        events.clone(),
        opener.clone(),
    );

    let entered = manager.enter_preview_mode(deep_link).await;
    if !entered {
        return Err(AppError::ValidationError(format!(
            "Not a preview deep link: {}",
            deep_link
        )));
    }

    let callback_handled = match callback_url {
        Some(url) => Some(manager.handle_callback_url(url).await),
        None => None,
    };

    Ok(HarnessReport {
        entered,
        callback_handled,
        events: events.events(),
        opened_urls: opener.opened(),
        snapshot: manager.snapshot(),
    })
}

pub fn run() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(deep_link) = args.first() else {
        error!("Usage: target-preview <deep-link> [callback-url]");
        std::process::exit(2);
    };
    let callback_url = args.get(1).map(String::as_str);

    let config_service = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => ConfigService::with_file(path),
        Err(_) => ConfigService::new(),
    };

    let outcome = tokio::runtime::Runtime::new()
        .map_err(|e| AppError::Internal(format!("Failed to start runtime: {}", e)))
        .and_then(|runtime| {
            runtime.block_on(async {
                let config = config_service.load()?;
                let network = Arc::new(ReqwestNetworkService::with_config(&config)?);
                run_harness(config, network, deep_link, callback_url).await
            })
        });

    match outcome {
        Ok(report) => {
            for event in &report.events {
                info!(
                    name = %event.name,
                    preview_initiated = ?event.preview_initiated(),
                    "Lifecycle event dispatched"
                );
            }
            for url in &report.opened_urls {
                info!(url = %url, "Restart link opened");
            }
            info!(
                state = ?report.snapshot.state,
                callback_handled = ?report.callback_handled,
                "Preview harness finished"
            );
        }
        Err(e) => {
            error!(error = %e, "Preview harness failed");
            std::process::exit(1);
        }
    }
}
