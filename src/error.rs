//! Error types shared by the stores and the backend client.

use thiserror::Error;

/// Failures talking to the backend.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response. `message` is the server-supplied text when there was one.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// The message to show a user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Http(e) if e.is_timeout() => "The server took too long to respond".to_string(),
            ApiError::Http(e) if e.is_connect() => "Could not reach the server".to_string(),
            other => other.to_string(),
        }
    }
}

/// Failures of the local key/value store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt stored value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Errors surfaced by the session and conversation stores.
#[derive(Error, Debug)]
pub enum DocChatError {
    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Registration(String),

    #[error("{0}")]
    Verification(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Unsupported file type '{0}' (supported: PDF, DOC, DOCX, TXT, HTML)")]
    UnsupportedDocument(String),

    #[error("File is too large ({size} bytes, limit {limit})")]
    DocumentTooLarge { size: u64, limit: u64 },

    #[error("Message not sent: {0}")]
    Messaging(String),

    #[error("Could not delete chat: {0}")]
    Deletion(String),

    #[error("You need to sign in first")]
    NotSignedIn,

    #[error("Local storage failed: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T, E = DocChatError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_shows_server_message() {
        let err = ApiError::Status {
            status: 401,
            message: "Incorrect credentials".to_string(),
        };
        assert_eq!(err.to_string(), "Incorrect credentials");
        assert_eq!(err.user_message(), "Incorrect credentials");
    }

    #[test]
    fn test_authentication_displays_bare_message() {
        let err = DocChatError::Authentication("Incorrect credentials".to_string());
        assert_eq!(err.to_string(), "Incorrect credentials");
    }

    #[test]
    fn test_too_large_message() {
        let err = DocChatError::DocumentTooLarge { size: 30, limit: 20 };
        assert_eq!(err.to_string(), "File is too large (30 bytes, limit 20)");
    }
}
