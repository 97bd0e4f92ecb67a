use std::fmt;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// One pushed value. Serializes as `{"value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveEvent {
    pub value: Value,
}

impl LiveEvent {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Wire form sent to clients.
    pub fn to_message(&self) -> String {
        serde_json::json!({ "value": self.value }).to_string()
    }
}

/// Identifies a subscriber within the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Time-ordered (UUID v7).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
