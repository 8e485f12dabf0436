use tracing::info;

/// UI hooks implemented by the host. The preview workflow only calls these at
/// its transition points and never renders anything itself.
pub trait PreviewUiDelegate: Send + Sync {
    fn show_entry_button(&self);
    fn hide_entry_button(&self);
    fn show_full_screen_surface(&self, content: &str);
    fn dismiss_full_screen_surface(&self);
}

/// Reports every UI call through `tracing`, for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingUiDelegate;

impl PreviewUiDelegate for TracingUiDelegate {
    fn show_entry_button(&self) {
        info!("Preview entry button shown");
    }

    fn hide_entry_button(&self) {
        info!("Preview entry button hidden");
    }

    fn show_full_screen_surface(&self, content: &str) {
        info!(content_len = content.len(), "Preview surface shown");
    }

    fn dismiss_full_screen_surface(&self) {
        info!("Preview surface dismissed");
    }
}
