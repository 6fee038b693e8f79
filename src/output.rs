//! Single-line JSON envelopes for webhook-style callers.
//!
//! Success is `{"result": ...}`, failure is `{"error": "..."}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    Result(Value),
    Error(String),
}

impl Envelope {
    pub fn ok<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Envelope::Result(serde_json::to_value(value)?))
    }

    pub fn err(message: impl std::fmt::Display) -> Self {
        Envelope::Error(message.to_string())
    }

    /// Render as one line of JSON.
    pub fn to_line(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"failed to encode output: {e}"}}"#))
    }
}
