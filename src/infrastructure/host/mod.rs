//! Capabilities the host runtime hands to the preview workflow.

pub mod events;
pub mod memory;
pub mod ui;
pub mod url_opener;

pub use events::EventDispatcher;
pub use memory::{MemoryEventDispatcher, MemoryUiDelegate, MemoryUrlOpener, UiCall};
pub use ui::{PreviewUiDelegate, TracingUiDelegate};
pub use url_opener::UrlOpener;
