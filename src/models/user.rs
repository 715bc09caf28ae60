//! Authenticated identity.

use serde::{Deserialize, Serialize};

/// The signed-in user as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Set once the email verification link has been followed
    #[serde(default, alias = "verify")]
    pub verified: bool,
    /// Conversations embedded in the login response. Kept opaque here; the
    /// conversation store decides what it can use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chats: Option<Vec<serde_json::Value>>,
}

impl User {
    /// Name to show in the UI, falling back to the local part of the email.
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            return self.name.trim();
        }
        self.email.split('@').next().unwrap_or(&self.email)
    }
}
