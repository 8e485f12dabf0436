pub mod deep_link;
pub mod preview_manager;
pub mod qa_mode;
pub mod web_view_fetcher;
