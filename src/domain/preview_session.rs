use crate::domain::error::{AppError, Result};
use crate::domain::preview_parameters::PreviewParameters;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewState {
    Inactive,
    Entered,
    Confirmed,
}

/// Identifies one fetch of the preview web view. A completion is only applied
/// while both the generation and the request URL still match the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub request_url: String,
}

/// Read-only view of the session handed out to the host.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewSnapshot {
    pub state: PreviewState,
    pub token: Option<String>,
    pub endpoint: String,
    pub request_url: Option<String>,
    pub parameters: Option<PreviewParameters>,
    pub entry_button_visible: bool,
    pub surface_visible: bool,
}

#[derive(Debug, Clone)]
pub struct PreviewSession {
    state: PreviewState,
    token: Option<String>,
    default_endpoint: String,
    endpoint: String,
    parameters: Option<PreviewParameters>,
    request_url: Option<String>,
    web_view_html: Option<String>,
    generation: u64,
    fetch_in_flight: bool,
    entry_button_visible: bool,
    surface_visible: bool,
}

impl PreviewSession {
    pub fn new(default_endpoint: impl Into<String>) -> Self {
        let default_endpoint = default_endpoint.into();
        Self {
            state: PreviewState::Inactive,
            token: None,
            endpoint: default_endpoint.clone(),
            default_endpoint,
            parameters: None,
            request_url: None,
            web_view_html: None,
            generation: 0,
            fetch_in_flight: false,
            entry_button_visible: false,
            surface_visible: false,
        }
    }

    /// Starts a new session, replacing whatever was active. The token is kept
    /// exactly as decoded.
    pub fn enter(&mut self, token: &str, endpoint: Option<&str>, client_code: &str) -> Result<()> {
        if token.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Preview token is required.".to_string(),
            ));
        }

        let endpoint = endpoint
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .unwrap_or(self.default_endpoint.as_str())
            .to_string();
        let request_url = build_preview_request_url(&endpoint, client_code, token)?;

        self.generation += 1;
        self.state = PreviewState::Entered;
        self.token = Some(token.to_string());
        self.endpoint = endpoint;
        self.parameters = None;
        self.request_url = Some(request_url);
        self.web_view_html = None;
        self.fetch_in_flight = false;
        self.entry_button_visible = true;
        self.surface_visible = false;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, PreviewState::Entered | PreviewState::Confirmed)
    }

    /// Claims the single fetch slot for the current generation. The slot is
    /// released by `complete_fetch` or `abandon_fetch`.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if !self.is_active() || self.fetch_in_flight {
            return None;
        }
        let request_url = self.request_url.clone()?;
        self.fetch_in_flight = true;
        Some(FetchTicket {
            generation: self.generation,
            request_url,
        })
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.is_active()
            && self.generation == ticket.generation
            && self.request_url.as_deref() == Some(ticket.request_url.as_str())
    }

    /// Applies a fetch result. Returns the HTML to display, or `None` when the
    /// ticket is stale or the body is empty.
    pub fn complete_fetch(&mut self, ticket: &FetchTicket, body: Option<String>) -> Option<String> {
        if !self.is_current(ticket) {
            return None;
        }
        self.fetch_in_flight = false;

        let html = body.filter(|body| !body.trim().is_empty())?;
        self.web_view_html = Some(html.clone());
        self.surface_visible = true;
        Some(html)
    }

    /// Releases the fetch slot of a ticket whose result will never arrive.
    /// Tickets from an earlier generation are ignored.
    pub fn abandon_fetch(&mut self, ticket: &FetchTicket) {
        if self.is_current(ticket) {
            self.fetch_in_flight = false;
        }
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    pub fn confirm(&mut self, parameters: PreviewParameters) -> Result<()> {
        if !self.is_active() {
            return Err(AppError::ValidationError(
                "No active preview session to confirm.".to_string(),
            ));
        }
        self.parameters = Some(parameters);
        self.state = PreviewState::Confirmed;
        self.surface_visible = false;
        Ok(())
    }

    /// Clears the session back to its initial state. Bumping the generation
    /// invalidates any fetch still in flight.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = PreviewState::Inactive;
        self.token = None;
        self.endpoint = self.default_endpoint.clone();
        self.parameters = None;
        self.request_url = None;
        self.web_view_html = None;
        self.fetch_in_flight = false;
        self.entry_button_visible = false;
        self.surface_visible = false;
    }

    pub fn mark_surface_visible(&mut self, visible: bool) {
        self.surface_visible = visible;
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn parameters(&self) -> Option<&PreviewParameters> {
        self.parameters.as_ref()
    }

    pub fn request_url(&self) -> Option<&str> {
        self.request_url.as_deref()
    }

    pub fn web_view_html(&self) -> Option<&str> {
        self.web_view_html.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn surface_visible(&self) -> bool {
        self.surface_visible
    }

    pub fn entry_button_visible(&self) -> bool {
        self.entry_button_visible
    }

    pub fn snapshot(&self) -> PreviewSnapshot {
        PreviewSnapshot {
            state: self.state,
            token: self.token.clone(),
            endpoint: self.endpoint.clone(),
            request_url: self.request_url.clone(),
            parameters: self.parameters.clone(),
            entry_button_visible: self.entry_button_visible,
            surface_visible: self.surface_visible,
        }
    }
}

/// `https://{endpoint}/ui/admin/{client_code}/preview?token={token}`
pub fn build_preview_request_url(endpoint: &str, client_code: &str, token: &str) -> Result<String> {
    let client_code = client_code.trim();
    if client_code.is_empty() {
        return Err(AppError::ValidationError(
            "Client code is required to build the preview URL.".to_string(),
        ));
    }

    let mut url = url::Url::parse(&format!(
        "https://{}/ui/admin/{}/preview",
        endpoint, client_code
    ))?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_ENDPOINT: &str = "hal.testandtarget.omniture.com";

    #[test]
    fn test_new_session_is_inactive() {
        let session = PreviewSession::new(DEFAULT_ENDPOINT);
        assert_eq!(session.state(), PreviewState::Inactive);
        assert!(session.token().is_none());
        assert!(session.request_url().is_none());
        assert_eq!(session.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_enter_builds_default_request_url() {
        let mut session = PreviewSession::new(DEFAULT_ENDPOINT);
        session.enter("abcd", None, "acme").unwrap();

        assert_eq!(session.state(), PreviewState::Entered);
        assert_eq!(session.token(), Some("abcd"));
        assert_eq!(
            session.request_url(),
            Some("https://hal.testandtarget.omniture.com/ui/admin/acme/preview?token=abcd")
        );
    }

    #[test]
    fn test_enter_with_endpoint_override() {
        let mut session = PreviewSession::new(DEFAULT_ENDPOINT);
        session
            .enter("abcd", Some("awesomeendpoint"), "acme")
            .unwrap();

        let url = url::Url::parse(session.request_url().unwrap()).unwrap();
        assert_eq!(url.host_str(), Some("awesomeendpoint"));
        assert_eq!(session.endpoint(), "awesomeendpoint");
    }

    #[test]
    fn test_enter_rejects_empty_token() {
        let mut session = PreviewSession::new(DEFAULT_ENDPOINT);
        assert!(session.enter("  ", None, "acme").is_err());
        assert_eq!(session.state(), PreviewState::Inactive);
    }

    #[test]
    fn test_enter_rejects_missing_client_code() {
        let mut session = PreviewSession::new(DEFAULT_ENDPOINT);
        assert!(session.enter("abcd", None, "").is_err());
        assert_eq!(session.state(), PreviewState::Inactive);
    }

    #[test]
    fn test_confirm_requires_active_session() {
        let mut session = PreviewSession::new(DEFAULT_ENDPOINT);
        assert!(session.confirm(PreviewParameters::default()).is_err());
        assert!(session.parameters().is_none());
    }

    #[test]
    fn test_single_fetch_in_flight() {
        let mut session = PreviewSession::new(DEFAULT_ENDPOINT);
        assert!(session.begin_fetch().is_none());

        session.enter("abcd", None, "acme").unwrap();
        let ticket = session.begin_fetch().unwrap();
        assert!(session.begin_fetch().is_none());

        let html = session.complete_fetch(&ticket, Some("<html/>".to_string()));
        assert_eq!(html.as_deref(), Some("<html/>"));
        assert!(session.begin_fetch().is_some());
    }

    #[test]
    fn test_abandoned_fetch_releases_slot() {
        let mut session = PreviewSession::new(DEFAULT_ENDPOINT);
        session.enter("abcd", None, "acme").unwrap();
        let ticket = session.begin_fetch().unwrap();
        assert!(session.fetch_in_flight());

        session.abandon_fetch(&ticket);
        assert!(!session.fetch_in_flight());
        assert!(session.begin_fetch().is_some());
    }

    #[test]
    fn test_abandoning_stale_ticket_keeps_current_fetch() {
        let mut session = PreviewSession::new(DEFAULT_ENDPOINT);
        session.enter("first", None, "acme").unwrap();
        let stale = session.begin_fetch().unwrap();
        session.enter("second", None, "acme").unwrap();
        let _current = session.begin_fetch().unwrap();

        session.abandon_fetch(&stale);
        assert!(session.fetch_in_flight());
        assert!(session.begin_fetch().is_none());
    }

    #[test]
    fn test_token_is_kept_verbatim() {
        let mut session = PreviewSession::new(DEFAULT_ENDPOINT);
        session.enter(" abcd ", None, "acme").unwrap();

        assert_eq!(session.token(), Some(" abcd "));
        let url = url::Url::parse(session.request_url().unwrap()).unwrap();
        let token = url
            .query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned());
        assert_eq!(token.as_deref(), Some(" abcd "));
    }

    #[test]
    fn test_empty_body_is_not_displayed() {
        let mut session = PreviewSession::new(DEFAULT_ENDPOINT);
        session.enter("abcd", None, "acme").unwrap();
        let ticket = session.begin_fetch().unwrap();

        assert!(session.complete_fetch(&ticket, Some("   ".to_string())).is_none());
        assert!(session.web_view_html().is_none());
        assert!(!session.surface_visible());
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut session = PreviewSession::new(DEFAULT_ENDPOINT);
        session.enter("first", None, "acme").unwrap();
        let stale = session.begin_fetch().unwrap();

        session.enter("second", None, "acme").unwrap();
        let current = session.begin_fetch().unwrap();

        assert!(session
            .complete_fetch(&stale, Some("old".to_string()))
            .is_none());
        assert!(session.web_view_html().is_none());
        assert_eq!(
            session
                .complete_fetch(&current, Some("new".to_string()))
                .as_deref(),
            Some("new")
        );
    }

    #[test]
    fn test_reset_clears_everything_but_default_endpoint() {
        let mut session = PreviewSession::new(DEFAULT_ENDPOINT);
        session.enter("abcd", Some("custom"), "acme").unwrap();
        session.confirm(PreviewParameters::default()).unwrap();
        session.reset();

        assert_eq!(session.state(), PreviewState::Inactive);
        assert!(session.token().is_none());
        assert!(session.parameters().is_none());
        assert!(session.request_url().is_none());
        assert_eq!(session.endpoint(), DEFAULT_ENDPOINT);
    }
}
