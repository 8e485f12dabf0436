use super::deep_link::query_params;
use crate::domain::preview_parameters::PreviewParameters;
use tracing::{debug, warn};
use url::Url;

pub const PREVIEW_PARAMETERS_KEY: &str = "at_preview_params";
pub const CONFIRM_ACTION: &str = "confirm";
pub const CANCEL_ACTION: &str = "cancel";
/// Scheme used by the preview web view when the action sits in the host part,
/// e.g. `adbinapp://confirm?at_preview_params=...`.
pub const IN_APP_SCHEME: &str = "adbinapp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Confirm,
    Cancel,
}

impl CallbackAction {
    fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case(CONFIRM_ACTION) {
            Some(CallbackAction::Confirm)
        } else if name.eq_ignore_ascii_case(CANCEL_ACTION) {
            Some(CallbackAction::Cancel)
        } else {
            None
        }
    }
}

pub fn resolve_callback_action(url: &Url) -> Option<CallbackAction> {
    if url.scheme() == IN_APP_SCHEME {
        return url.host_str().and_then(CallbackAction::from_name);
    }
    CallbackAction::from_name(url.scheme())
}

/// Decodes the QA-mode block of a confirmation URL. A missing or unreadable
/// payload yields the empty parameter set.
pub fn decode_qa_mode(url: &Url) -> PreviewParameters {
    let Some(payload) = query_params(url).and_then(|mut params| params.remove(PREVIEW_PARAMETERS_KEY))
    else {
        debug!("Confirmation URL carries no preview parameters");
        return PreviewParameters::default();
    };

    match PreviewParameters::from_json_str(&payload) {
        Some(parameters) => parameters,
        None => {
            warn!(
                payload_len = payload.len(),
                "Preview parameters are not valid JSON, using defaults"
            );
            PreviewParameters::default()
        }
    }
}
