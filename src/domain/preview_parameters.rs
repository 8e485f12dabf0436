//! QA-mode overrides carried by a confirmed preview session.
//!
//! Decoding is lenient: every field is read on its own and a missing or
//! mistyped field falls back to its empty value instead of failing the whole
//! payload. The canonical string form is `{"qaMode":{...}}` with sorted keys and
//! sorted set/map entries, so two equal parameter sets always serialize to the
//! same string.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

pub const QA_MODE_KEY: &str = "qaMode";

const TOKEN_KEY: &str = "token";
const BYPASS_ENTRY_AUDIENCE_KEY: &str = "bypassEntryAudience";
const LISTED_ACTIVITIES_ONLY_KEY: &str = "listedActivitiesOnly";
const EVALUATE_AS_TRUE_KEY: &str = "evaluateAsTrueAudienceIds";
const EVALUATE_AS_FALSE_KEY: &str = "evaluateAsFalseAudienceIds";
const PREVIEW_INDEXES_KEY: &str = "previewIndexes";
const ACTIVITY_INDEX_KEY: &str = "activityIndex";
const EXPERIENCE_INDEX_KEY: &str = "experienceIndex";

/// Audience identifier as sent by the preview UI. Ids keep their JSON type so
/// re-encoding reproduces the payload.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AudienceId {
    Number(i64),
    Text(String),
}

impl AudienceId {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_i64().map(AudienceId::Number),
            Value::String(text) if !text.trim().is_empty() => {
                Some(AudienceId::Text(text.trim().to_string()))
            }
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            AudienceId::Number(number) => json!(number),
            AudienceId::Text(text) => json!(text),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewParameters {
    pub token: Option<String>,
    pub bypass_entry_audience: bool,
    pub listed_activities_only: bool,
    pub evaluate_as_true_audience_ids: BTreeSet<AudienceId>,
    pub evaluate_as_false_audience_ids: BTreeSet<AudienceId>,
    /// Activity index → experience index.
    pub preview_indexes: BTreeMap<u64, u64>,
}

impl PreviewParameters {
    /// Parses a JSON payload, either wrapped in `{"qaMode": ...}` or bare.
    /// Returns `None` only when the text is not JSON at all.
    pub fn from_json_str(payload: &str) -> Option<Self> {
        serde_json::from_str::<Value>(payload)
            .ok()
            .map(|value| Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let qa_mode = match value.get(QA_MODE_KEY) {
            Some(inner) => inner,
            None => value,
        };
        let Some(fields) = qa_mode.as_object() else {
            return Self::default();
        };

        Self {
            token: fields
                .get(TOKEN_KEY)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string),
            bypass_entry_audience: read_flag(fields, BYPASS_ENTRY_AUDIENCE_KEY),
            listed_activities_only: read_flag(fields, LISTED_ACTIVITIES_ONLY_KEY),
            evaluate_as_true_audience_ids: read_audience_ids(fields, EVALUATE_AS_TRUE_KEY),
            evaluate_as_false_audience_ids: read_audience_ids(fields, EVALUATE_AS_FALSE_KEY),
            preview_indexes: read_preview_indexes(fields.get(PREVIEW_INDEXES_KEY)),
        }
    }

    /// The bare qaMode object.
    pub fn to_value(&self) -> Value {
        let mut fields = Map::new();
        if let Some(token) = &self.token {
            fields.insert(TOKEN_KEY.to_string(), json!(token));
        }
        fields.insert(
            BYPASS_ENTRY_AUDIENCE_KEY.to_string(),
            json!(self.bypass_entry_audience),
        );
        fields.insert(
            LISTED_ACTIVITIES_ONLY_KEY.to_string(),
            json!(self.listed_activities_only),
        );
        fields.insert(
            EVALUATE_AS_TRUE_KEY.to_string(),
            Value::Array(
                self.evaluate_as_true_audience_ids
                    .iter()
                    .map(AudienceId::to_value)
                    .collect(),
            ),
        );
        fields.insert(
            EVALUATE_AS_FALSE_KEY.to_string(),
            Value::Array(
                self.evaluate_as_false_audience_ids
                    .iter()
                    .map(AudienceId::to_value)
                    .collect(),
            ),
        );
        fields.insert(
            PREVIEW_INDEXES_KEY.to_string(),
            Value::Array(
                self.preview_indexes
                    .iter()
                    .map(|(activity, experience)| {
                        json!({
                            ACTIVITY_INDEX_KEY: activity,
                            EXPERIENCE_INDEX_KEY: experience,
                        })
                    })
                    .collect(),
            ),
        );
        Value::Object(fields)
    }

    pub fn to_canonical_json(&self) -> String {
        json!({ QA_MODE_KEY: self.to_value() }).to_string()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Serialize for PreviewParameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

fn read_flag(fields: &Map<String, Value>, key: &str) -> bool {
    match fields.get(key) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => text.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn read_audience_ids(fields: &Map<String, Value>, key: &str) -> BTreeSet<AudienceId> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(AudienceId::from_value).collect())
        .unwrap_or_default()
}

fn read_index(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

// Accepts the delivery API list form and a plain `{"activity": experience}` map.
fn read_preview_indexes(value: Option<&Value>) -> BTreeMap<u64, u64> {
    match value {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| {
                let activity = read_index(entry.get(ACTIVITY_INDEX_KEY))?;
                let experience = read_index(entry.get(EXPERIENCE_INDEX_KEY))?;
                Some((activity, experience))
            })
            .collect(),
        Some(Value::Object(entries)) => entries
            .iter()
            .filter_map(|(activity, experience)| {
                let activity = activity.trim().parse().ok()?;
                let experience = read_index(Some(experience))?;
                Some((activity, experience))
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_PAYLOAD: &str = r#"{
        "qaMode": {
            "token": "abcd",
            "bypassEntryAudience": true,
            "listedActivitiesOnly": true,
            "evaluateAsTrueAudienceIds": [2149, "seg-7"],
            "evaluateAsFalseAudienceIds": [1234, 5678, 9012],
            "previewIndexes": [
                {"activityIndex": 1, "experienceIndex": 2},
                {"activityIndex": 3, "experienceIndex": 1}
            ]
        }
    }"#;

    #[test]
    fn test_decode_full_payload() {
        let params = PreviewParameters::from_json_str(FULL_PAYLOAD).unwrap();

        assert_eq!(params.token.as_deref(), Some("abcd"));
        assert!(params.bypass_entry_audience);
        assert!(params.listed_activities_only);
        assert_eq!(params.evaluate_as_true_audience_ids.len(), 2);
        assert!(params
            .evaluate_as_true_audience_ids
            .contains(&AudienceId::Text("seg-7".to_string())));
        assert_eq!(params.evaluate_as_false_audience_ids.len(), 3);
        assert_eq!(params.preview_indexes.get(&1), Some(&2));
        assert_eq!(params.preview_indexes.get(&3), Some(&1));
    }

    #[test]
    fn test_decode_bare_object_without_wrapper() {
        let params =
            PreviewParameters::from_json_str(r#"{"bypassEntryAudience": true}"#).unwrap();
        assert!(params.bypass_entry_audience);
        assert!(!params.listed_activities_only);
        assert!(params.token.is_none());
    }

    #[test]
    fn test_missing_and_mistyped_fields_default() {
        let params = PreviewParameters::from_json_str(
            r#"{"qaMode": {"listedActivitiesOnly": 7, "evaluateAsTrueAudienceIds": "nope", "previewIndexes": [{"activityIndex": 1}]}}"#,
        )
        .unwrap();
        assert_eq!(params, PreviewParameters::default());
        assert!(params.is_empty());
    }

    #[test]
    fn test_non_json_payload_is_none() {
        assert!(PreviewParameters::from_json_str("{not json").is_none());
    }

    #[test]
    fn test_object_form_preview_indexes() {
        let params =
            PreviewParameters::from_json_str(r#"{"previewIndexes": {"4": 2, "x": 1}}"#).unwrap();
        assert_eq!(params.preview_indexes.len(), 1);
        assert_eq!(params.preview_indexes.get(&4), Some(&2));
    }

    #[test]
    fn test_reencode_preserves_values_and_counts() {
        let decoded = PreviewParameters::from_json_str(FULL_PAYLOAD).unwrap();
        let reencoded = decoded.to_canonical_json();
        let redecoded = PreviewParameters::from_json_str(&reencoded).unwrap();

        assert_eq!(redecoded, decoded);
        assert_eq!(redecoded.evaluate_as_true_audience_ids.len(), 2);
        assert_eq!(redecoded.evaluate_as_false_audience_ids.len(), 3);
        assert_eq!(redecoded.preview_indexes.len(), 2);
    }

    #[test]
    fn test_canonical_form_ignores_input_order() {
        let a = PreviewParameters::from_json_str(
            r#"{"evaluateAsFalseAudienceIds": [3, 1, 2], "previewIndexes": [{"activityIndex": 9, "experienceIndex": 1}, {"activityIndex": 2, "experienceIndex": 5}]}"#,
        )
        .unwrap();
        let b = PreviewParameters::from_json_str(
            r#"{"previewIndexes": [{"activityIndex": 2, "experienceIndex": 5}, {"activityIndex": 9, "experienceIndex": 1}], "evaluateAsFalseAudienceIds": [2, 3, 1]}"#,
        )
        .unwrap();
        assert_eq!(a.to_canonical_json(), b.to_canonical_json());
    }

    #[test]
    fn test_audience_ids_keep_json_type() {
        let params = PreviewParameters::from_json_str(
            r#"{"evaluateAsTrueAudienceIds": [12, "12"]}"#,
        )
        .unwrap();
        assert_eq!(params.evaluate_as_true_audience_ids.len(), 2);
        let value = params.to_value();
        assert_eq!(value[EVALUATE_AS_TRUE_KEY], json!([12, "12"]));
    }
}
