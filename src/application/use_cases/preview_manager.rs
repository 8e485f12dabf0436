//! Preview mode workflow.
//!
//! The manager is the single owner of the preview session. All session
//! mutations and UI hook calls happen under one lock, so a dismiss is always
//! issued before the state it belongs to is reset or replaced, and a late fetch
//! result can never paint over a newer session. Event dispatch and URL opening
//! run after the lock is released.

use super::deep_link::parse_preview_deep_link;
use super::qa_mode::{decode_qa_mode, resolve_callback_action, CallbackAction};
use super::web_view_fetcher::WebViewFetcher;
use crate::domain::preview_parameters::PreviewParameters;
use crate::domain::preview_session::{
    FetchTicket, PreviewSession, PreviewSnapshot, PreviewState,
};
use crate::domain::target_event::TargetEvent;
use crate::infrastructure::config::PreviewConfig;
use crate::infrastructure::host::{EventDispatcher, PreviewUiDelegate, UrlOpener};
use crate::infrastructure::http::NetworkService;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};
use url::Url;

pub struct PreviewManager {
    config: PreviewConfig,
    session: Mutex<PreviewSession>,
    restart_deep_link: Mutex<Option<String>>,
    fetcher: WebViewFetcher,
    ui: Arc<dyn PreviewUiDelegate>,
    events: Arc<dyn EventDispatcher>,
    url_opener: Arc<dyn UrlOpener>,
}

impl PreviewManager {
    /// UI hooks are invoked while the session is locked; a delegate must not
    /// call back into the manager from inside a hook.
    pub fn new(
        config: PreviewConfig,
        network: Arc<dyn NetworkService>,
        ui: Arc<dyn PreviewUiDelegate>,
        events: Arc<dyn EventDispatcher>,
        url_opener: Arc<dyn UrlOpener>,
    ) -> Self {
        let fetcher = WebViewFetcher::new(network, &config);
        let session = PreviewSession::new(config.default_endpoint.clone());
        Self {
            config,
            session: Mutex::new(session),
            restart_deep_link: Mutex::new(None),
            fetcher,
            ui,
            events,
            url_opener,
        }
    }

    fn session(&self) -> MutexGuard<'_, PreviewSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enters preview mode from a deep link. Returns `false` when the link is
    /// not a preview link or preview is not allowed; nothing is touched then.
    pub async fn enter_preview_mode(&self, deep_link: &str) -> bool {
        let Some(link) = parse_preview_deep_link(deep_link) else {
            debug!("Deep link is not a preview link");
            return false;
        };
        if let Err(e) = self.config.ensure_preview_allowed() {
            warn!(error = %e, "Preview mode requested but not allowed");
            return false;
        }

        {
            let mut session = self.session();
            let mut next = session.clone();
            if let Err(e) = next.enter(
                &link.token,
                link.endpoint.as_deref(),
                &self.config.client_code,
            ) {
                warn!(error = %e, "Unable to start preview session");
                return false;
            }
            if session.surface_visible() {
                self.ui.dismiss_full_screen_surface();
            }
            *session = next;
            self.ui.show_entry_button();
            info!(
                endpoint = session.endpoint(),
                generation = session.generation(),
                "Preview mode entered"
            );
        }

        if let Some(restart_deep_link) = link.restart_deep_link {
            self.set_restart_deep_link(Some(restart_deep_link));
        }

        self.fetch_web_view().await;
        true
    }

    /// Fetches the preview web view for the current session and shows it.
    /// Returns whether content was displayed.
    pub async fn fetch_web_view(&self) -> bool {
        let ticket = self.session().begin_fetch();
        let Some(ticket) = ticket else {
            debug!("No preview fetch started");
            return false;
        };

        let slot = FetchSlot::claim(self, ticket);
        let body = self.fetcher.fetch(&slot.ticket.request_url).await;
        let ticket = slot.release();

        let mut session = self.session();
        let stale = !session.is_current(&ticket);
        match session.complete_fetch(&ticket, body) {
            Some(html) => {
                self.ui.show_full_screen_surface(&html);
                true
            }
            None => {
                if stale {
                    debug!(
                        generation = ticket.generation,
                        "Discarding preview web view for a superseded session"
                    );
                }
                false
            }
        }
    }

    /// Floating button tap: re-show the cached web view, or fetch it if the
    /// first attempt produced nothing.
    pub async fn on_entry_button_tapped(&self) -> bool {
        {
            let mut session = self.session();
            if !session.is_active() || session.surface_visible() {
                return false;
            }
            if let Some(html) = session.web_view_html().map(str::to_string) {
                self.ui.show_full_screen_surface(&html);
                session.mark_surface_visible(true);
                return true;
            }
        }
        self.fetch_web_view().await
    }

    /// Handles a callback URL from the preview surface. Returns whether it was
    /// a recognised confirm/cancel URL for an active session.
    pub async fn handle_callback_url(&self, callback_url: &str) -> bool {
        if !self.session().is_active() {
            debug!("Preview callback received with no active preview");
            return false;
        }

        let Ok(url) = Url::parse(callback_url.trim()) else {
            debug!("Preview callback is not a URL");
            return false;
        };
        let Some(action) = resolve_callback_action(&url) else {
            debug!(scheme = url.scheme(), "Not a preview callback URL");
            return false;
        };

        match action {
            CallbackAction::Confirm => self.confirm(&url).await,
            CallbackAction::Cancel => self.cancel().await,
        }
    }

    async fn confirm(&self, url: &Url) -> bool {
        let parameters = decode_qa_mode(url);
        {
            let mut session = self.session();
            if let Err(e) = session.confirm(parameters) {
                debug!(error = %e, "Preview session ended before confirmation");
                return false;
            }
            self.ui.dismiss_full_screen_surface();
        }
        info!("Preview confirmed");

        self.dispatch_lifecycle(true).await;

        if let Some(restart_deep_link) = self.restart_deep_link() {
            if let Err(e) = self.url_opener.open_url(&restart_deep_link).await {
                error!(error = %e, url = %restart_deep_link, "Failed to open preview restart link");
            }
        }
        true
    }

    async fn cancel(&self) -> bool {
        {
            let mut session = self.session();
            if !session.is_active() {
                return false;
            }
            self.ui.dismiss_full_screen_surface();
            self.ui.hide_entry_button();
            session.reset();
        }
        info!("Preview cancelled");

        self.dispatch_lifecycle(false).await;
        true
    }

    async fn dispatch_lifecycle(&self, preview_initiated: bool) {
        let event = TargetEvent::preview_lifecycle(preview_initiated);
        if let Err(e) = self.events.dispatch(event).await {
            error!(error = %e, preview_initiated, "Failed to dispatch preview lifecycle event");
        }
    }

    /// Tears preview mode down without reporting a lifecycle change. The
    /// restart link is kept.
    pub fn reset(&self) {
        let mut session = self.session();
        if session.surface_visible() {
            self.ui.dismiss_full_screen_surface();
        }
        if session.entry_button_visible() {
            self.ui.hide_entry_button();
        }
        session.reset();
    }

    pub fn set_restart_deep_link(&self, restart_deep_link: Option<String>) {
        let restart_deep_link = restart_deep_link
            .map(|link| link.trim().to_string())
            .filter(|link| !link.is_empty());
        *self
            .restart_deep_link
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = restart_deep_link;
    }

    pub fn restart_deep_link(&self) -> Option<String> {
        self.restart_deep_link
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> PreviewState {
        self.session().state()
    }

    pub fn preview_token(&self) -> Option<String> {
        self.session().token().map(str::to_string)
    }

    pub fn preview_parameters(&self) -> Option<PreviewParameters> {
        self.session().parameters().cloned()
    }

    /// Canonical string form of the QA parameters, for request payloads.
    pub fn preview_parameters_json(&self) -> Option<String> {
        self.session()
            .parameters()
            .map(PreviewParameters::to_canonical_json)
    }

    pub fn snapshot(&self) -> PreviewSnapshot {
        self.session().snapshot()
    }
}

/// Owns the session's fetch slot while a request is awaited. If the future
/// driving the fetch is dropped, the slot is handed back so a later tap can
/// fetch again.
struct FetchSlot<'a> {
    manager: &'a PreviewManager,
    ticket: FetchTicket,
    armed: bool,
}

impl<'a> FetchSlot<'a> {
    fn claim(manager: &'a PreviewManager, ticket: FetchTicket) -> Self {
        Self {
            manager,
            ticket,
            armed: true,
        }
    }

    fn release(mut self) -> FetchTicket {
        self.armed = false;
        self.ticket.clone()
    }
}

impl Drop for FetchSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(
                generation = self.ticket.generation,
                "Preview fetch abandoned before completion"
            );
            self.manager.session().abandon_fetch(&self.ticket);
        }
    }
}
