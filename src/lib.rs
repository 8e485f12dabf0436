//! Target preview mode for the mobile experience SDK extension.
//!
//! The host hands deep links and callback URLs to [`PreviewManager`]; the
//! manager drives the floating entry button, fetches the preview web view,
//! decodes the QA-mode parameters on confirmation and reports a
//! `Target Preview Lifecycle` event back through the host event bus.

mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use app::{init_tracing, run, run_harness, HarnessReport, CONFIG_PATH_ENV};
pub use application::PreviewManager;
pub use domain::error::{AppError, Result};
pub use domain::preview_parameters::{AudienceId, PreviewParameters};
pub use domain::preview_session::{PreviewSnapshot, PreviewState};
pub use domain::target_event::TargetEvent;
pub use infrastructure::config::{ConfigService, PreviewConfig};
pub use infrastructure::host::{EventDispatcher, PreviewUiDelegate, UrlOpener};
pub use infrastructure::http::{NetworkService, ReqwestNetworkService};
