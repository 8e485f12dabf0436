//! Recording host adapters. Each keeps every call it received so a host
//! harness (or a test) can inspect what the preview workflow asked for.

use super::events::EventDispatcher;
use super::ui::PreviewUiDelegate;
use super::url_opener::UrlOpener;
use crate::domain::error::{AppError, Result};
use crate::domain::target_event::TargetEvent;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCall {
    ShowEntryButton,
    HideEntryButton,
    ShowSurface(String),
    DismissSurface,
}

#[derive(Debug, Default)]
pub struct MemoryUiDelegate {
    calls: Mutex<Vec<UiCall>>,
}

impl MemoryUiDelegate {
    pub fn calls(&self) -> Vec<UiCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, call: &UiCall) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|recorded| *recorded == call)
            .count()
    }

    pub fn shown_surfaces(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                UiCall::ShowSurface(content) => Some(content),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: UiCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl PreviewUiDelegate for MemoryUiDelegate {
    fn show_entry_button(&self) {
        self.record(UiCall::ShowEntryButton);
    }

    fn hide_entry_button(&self) {
        self.record(UiCall::HideEntryButton);
    }

    fn show_full_screen_surface(&self, content: &str) {
        self.record(UiCall::ShowSurface(content.to_string()));
    }

    fn dismiss_full_screen_surface(&self) {
        self.record(UiCall::DismissSurface);
    }
}

#[derive(Debug, Default)]
pub struct MemoryEventDispatcher {
    events: Mutex<Vec<TargetEvent>>,
}

impl MemoryEventDispatcher {
    pub fn events(&self) -> Vec<TargetEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EventDispatcher for MemoryEventDispatcher {
    async fn dispatch(&self, event: TargetEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryUrlOpener {
    opened: Mutex<Vec<String>>,
    fail: bool,
}

impl MemoryUrlOpener {
    /// Records the URL, then reports a host failure.
    pub fn failing() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl UrlOpener for MemoryUrlOpener {
    async fn open_url(&self, url: &str) -> Result<()> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        if self.fail {
            return Err(AppError::HostError(format!("Unable to open {}", url)));
        }
        Ok(())
    }
}
