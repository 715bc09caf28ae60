//! Chat message as exchanged with the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One question/answer exchange within a conversation.
///
/// The backend returns the whole exchange in a single object, which is stored
/// as received. Fields this client doesn't know about are kept in `extra` so
/// they survive a round trip through local storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "response", skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default = "Utc::now", deserialize_with = "super::timestamp::lenient")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    /// Answer text, or a placeholder while the backend hasn't produced one.
    pub fn answer_text(&self) -> &str {
        self.answer.as_deref().unwrap_or("(no answer)")
    }
}
