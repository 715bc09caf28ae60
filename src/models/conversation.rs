//! Conversation ("chat") records: one uploaded document and its thread.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Message;

/// A document and the messages exchanged about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Where the backend stored the document (e.g. "public/u1_20240501_100000.pdf")
    #[serde(default)]
    pub document_path: String,
    /// Lowercase extension ("pdf", "docx", ...)
    #[serde(rename = "type", default)]
    pub doc_type: String,
    /// Document size in bytes
    #[serde(default)]
    pub size: u64,
    /// Summary generated by the backend on upload
    #[serde(default)]
    pub doc_summary: String,
    /// Last time the conversation changed
    #[serde(
        default = "Utc::now",
        alias = "updated_at",
        deserialize_with = "super::timestamp::lenient"
    )]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// What `POST /chat/create` returns for a fresh upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSeed {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub doc_summary: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub document_path: String,
}

impl Conversation {
    /// Build a new, empty conversation from an upload result.
    pub fn from_seed(seed: ConversationSeed, now: DateTime<Utc>) -> Self {
        let doc_type = seed
            .doc_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| extension_of(&seed.document_path));

        Self {
            id: seed.id,
            document_path: seed.document_path,
            doc_type: doc_type.to_lowercase(),
            size: seed.size.unwrap_or(0),
            doc_summary: seed.doc_summary,
            timestamp: now,
            messages: Vec::new(),
        }
    }

    /// File name component of the document path.
    pub fn document_name(&self) -> &str {
        self.document_path
            .rsplit(['/', '\\'])
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or("Untitled document")
    }

    /// Upper-case type label for lists ("PDF", or "DOCUMENT" when unknown).
    pub fn type_label(&self) -> String {
        if self.doc_type.is_empty() {
            "DOCUMENT".to_string()
        } else {
            self.doc_type.to_uppercase()
        }
    }

    /// The most recent answer in the thread, if any.
    pub fn last_answer(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| m.answer.as_deref())
    }
}

/// Lowercase extension of a path, or an empty string.
pub fn extension_of(path: &str) -> String {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn seed() -> ConversationSeed {
        serde_json::from_str(
            r#"{"id":"c1","type":"pdf","size":1000,"document_path":"/d/a.pdf","doc_summary":"s"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_from_seed_starts_empty() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let conv = Conversation::from_seed(seed(), now);
        assert_eq!(conv.id, "c1");
        assert_eq!(conv.doc_type, "pdf");
        assert_eq!(conv.size, 1000);
        assert_eq!(conv.doc_summary, "s");
        assert_eq!(conv.timestamp, now);
        assert!(conv.messages.is_empty());
    }

    #[test]
    fn test_type_falls_back_to_extension() {
        let seed: ConversationSeed =
            serde_json::from_str(r#"{"_id":"c2","document_path":"public/u1_x.DOCX"}"#).unwrap();
        let conv = Conversation::from_seed(seed, Utc::now());
        assert_eq!(conv.doc_type, "docx");
        assert_eq!(conv.type_label(), "DOCX");
        assert_eq!(conv.size, 0);
    }

    #[test]
    fn test_document_name() {
        let conv = Conversation::from_seed(seed(), Utc::now());
        assert_eq!(conv.document_name(), "a.pdf");

        let mut windows = conv.clone();
        windows.document_path = "public\\report.txt".to_string();
        assert_eq!(windows.document_name(), "report.txt");

        let mut empty = conv;
        empty.document_path.clear();
        assert_eq!(empty.document_name(), "Untitled document");
    }

    #[test]
    fn test_stored_form_round_trips() {
        let conv = Conversation::from_seed(seed(), Utc::now());
        let json = serde_json::to_string(&conv).unwrap();
        assert!(json.contains(r#""_id":"c1""#));
        assert!(json.contains(r#""type":"pdf""#));
        let back: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, conv);
    }

    #[test]
    fn test_zoneless_updated_at_is_utc() {
        let conv: Conversation = serde_json::from_str(
            r#"{"_id":"c3","updated_at":"2024-05-01T10:00:00","messages":[{"text":"q","timestamp":"2024-05-01T09:59:00"}]}"#,
        )
        .unwrap();
        assert_eq!(conv.timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        assert_eq!(
            conv.messages[0].timestamp,
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_last_answer_skips_unanswered() {
        let mut conv = Conversation::from_seed(seed(), Utc::now());
        assert!(conv.last_answer().is_none());
        conv.messages.push(serde_json::from_str(r#"{"text":"a","answer":"first"}"#).unwrap());
        conv.messages.push(serde_json::from_str(r#"{"text":"b"}"#).unwrap());
        assert_eq!(conv.last_answer(), Some("first"));
    }
}
