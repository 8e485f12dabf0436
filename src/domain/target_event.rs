use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const PREVIEW_LIFECYCLE_EVENT_NAME: &str = "Target Preview Lifecycle";
pub const EVENT_TYPE_TARGET: &str = "com.adobe.eventType.target";
pub const EVENT_SOURCE_RESPONSE_CONTENT: &str = "com.adobe.eventSource.responseContent";
pub const PREVIEW_INITIATED_KEY: &str = "ispreviewinitiated";

/// Event handed to the host event bus.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TargetEvent {
    pub id: String,
    pub name: String,
    pub event_type: String,
    pub source: String,
    pub data: Map<String, Value>,
    pub timestamp: i64,
}

impl TargetEvent {
    pub fn new(
        name: impl Into<String>,
        event_type: impl Into<String>,
        source: impl Into<String>,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            event_type: event_type.into(),
            source: source.into(),
            data,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn preview_lifecycle(preview_initiated: bool) -> Self {
        let mut data = Map::new();
        data.insert(
            PREVIEW_INITIATED_KEY.to_string(),
            Value::Bool(preview_initiated),
        );
        Self::new(
            PREVIEW_LIFECYCLE_EVENT_NAME,
            EVENT_TYPE_TARGET,
            EVENT_SOURCE_RESPONSE_CONTENT,
            data,
        )
    }

    pub fn preview_initiated(&self) -> Option<bool> {
        self.data.get(PREVIEW_INITIATED_KEY).and_then(Value::as_bool)
    }
}
