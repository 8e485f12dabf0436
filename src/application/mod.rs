pub mod use_cases;

pub use use_cases::deep_link::{parse_preview_deep_link, PreviewDeepLink};
pub use use_cases::preview_manager::PreviewManager;
pub use use_cases::qa_mode::{decode_qa_mode, CallbackAction};
pub use use_cases::web_view_fetcher::WebViewFetcher;
