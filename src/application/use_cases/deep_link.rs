use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

pub const PREVIEW_TOKEN_KEY: &str = "at_preview_token";
pub const PREVIEW_ENDPOINT_KEY: &str = "at_preview_endpoint";
pub const PREVIEW_RESTART_DEEPLINK_KEY: &str = "at_preview_restart_deeplink";

// A `%` not followed by two hex digits.
static MALFORMED_ESCAPE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([^0-9A-Fa-f]|[0-9A-Fa-f]([^0-9A-Fa-f]|$)|$)").unwrap());

const ENCODED_REPLACEMENT_CHAR: &str = "%ef%bf%bd";

/// Parameters recognised in a preview deep link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewDeepLink {
    pub token: String,
    pub endpoint: Option<String>,
    pub restart_deep_link: Option<String>,
}

/// Returns `None` for anything that is not a preview link: unparseable URL,
/// no query, or no non-empty token.
pub fn parse_preview_deep_link(deep_link: &str) -> Option<PreviewDeepLink> {
    let params = parse_query_params(deep_link)?;

    let token = params
        .get(PREVIEW_TOKEN_KEY)
        .filter(|token| !token.trim().is_empty())?;
    Some(PreviewDeepLink {
        token: token.clone(),
        endpoint: non_empty(params.get(PREVIEW_ENDPOINT_KEY)),
        restart_deep_link: non_empty(params.get(PREVIEW_RESTART_DEEPLINK_KEY)),
    })
}

pub fn parse_query_params(raw_url: &str) -> Option<HashMap<String, String>> {
    let url = Url::parse(raw_url.trim())
        .map_err(|e| debug!(error = %e, "Ignoring unparseable URL"))
        .ok()?;
    query_params(&url)
}

/// Percent-decoded query parameters. The first occurrence of a key wins; a
/// value with a broken escape is dropped on its own.
pub fn query_params(url: &Url) -> Option<HashMap<String, String>> {
    let query = url.query()?;

    let mut params = HashMap::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        if MALFORMED_ESCAPE_PATTERN.is_match(raw_key) {
            continue;
        }
        if MALFORMED_ESCAPE_PATTERN.is_match(raw_value) {
            debug!(key = raw_key, "Dropping query value with malformed percent-encoding");
            continue;
        }

        let Some((key, value)) = url::form_urlencoded::parse(pair.as_bytes()).next() else {
            continue;
        };
        if introduced_replacement_char(raw_value, &value) {
            debug!(key = %key, "Dropping query value that is not valid UTF-8");
            continue;
        }
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    Some(params)
}

fn introduced_replacement_char(raw: &str, decoded: &str) -> bool {
    decoded.contains('\u{FFFD}')
        && !raw.contains('\u{FFFD}')
        && !raw.to_ascii_lowercase().contains(ENCODED_REPLACEMENT_CHAR)
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
