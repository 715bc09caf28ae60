//! Chat store - the conversation list, the focused conversation, and the
//! upload / message / delete flows that change them.
//!
//! Every change to the list is written through to local storage under the
//! owning user's key, including the empty list. Focus is kept as an id into
//! the list so it can never point at a conversation that isn't there.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::api_client::Backend;
use super::local_store::{chats_key, LocalStore};
use crate::config::UploadConfig;
use crate::error::{DocChatError, Result, StorageError};
use crate::models::conversation::extension_of;
use crate::models::{Conversation, ConversationSeed, Message, User};

/// Figures for the dashboard cards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatStats {
    pub conversations: usize,
    pub messages: usize,
    /// Conversations touched today (local time)
    pub today: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Keep the entries of an opaque list that are usable conversations.
pub fn conversations_from_values(values: Vec<Value>) -> Vec<Conversation> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Conversation>(value) {
            Ok(conv) => Some(conv),
            Err(e) => {
                debug!("Skipping conversation entry: {}", e);
                None
            }
        })
        .collect()
}

/// Check a document before uploading it. Returns its extension and size.
pub fn validate_document(path: &Path, config: &UploadConfig) -> Result<(String, u64)> {
    let ext = extension_of(&path.to_string_lossy());
    if !config.allowed_types.iter().any(|t| t.eq_ignore_ascii_case(&ext)) {
        let shown = if ext.is_empty() { "(none)".to_string() } else { ext };
        return Err(DocChatError::UnsupportedDocument(shown));
    }

    let metadata = std::fs::metadata(path)
        .map_err(|e| DocChatError::Upload(format!("{}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(DocChatError::Upload(format!("{} is not a file", path.display())));
    }
    if metadata.len() > config.max_bytes {
        return Err(DocChatError::DocumentTooLarge {
            size: metadata.len(),
            limit: config.max_bytes,
        });
    }

    Ok((ext, metadata.len()))
}

/// Conversation list and focus for the signed-in user.
pub struct ChatStore {
    local: LocalStore,
    backend: Arc<dyn Backend>,
    upload: UploadConfig,
    /// Id of the user the list belongs to; `None` when signed out
    owner: Option<String>,
    chats: Vec<Conversation>,
    focused: Option<String>,
}

impl ChatStore {
    pub fn new(local: LocalStore, backend: Arc<dyn Backend>, upload: UploadConfig) -> Self {
        Self {
            local,
            backend,
            upload,
            owner: None,
            chats: Vec::new(),
            focused: None,
        }
    }

    /// Load the list for `session`, or clear everything when signed out.
    pub fn restore(&mut self, session: Option<&User>) -> Result<()> {
        let Some(user) = session else {
            self.owner = None;
            self.chats.clear();
            self.focused = None;
            return Ok(());
        };

        self.chats = match self.local.get_json::<Vec<Conversation>>(&chats_key(&user.id)) {
            Ok(list) => list.unwrap_or_default(),
            Err(StorageError::Json(e)) => {
                warn!("Stored conversations for {} are unreadable, starting empty: {}", user.id, e);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        self.owner = Some(user.id.clone());
        if self
            .focused
            .as_deref()
            .is_some_and(|id| self.index_of(id).is_none())
        {
            self.focused = None;
        }

        debug!("Restored {} conversations for {}", self.chats.len(), user.id);
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        if let Some(owner) = &self.owner {
            self.local.set_json(&chats_key(owner), &self.chats)?;
        }
        Ok(())
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.chats.iter().position(|c| c.id == id)
    }

    /// Add a conversation for a finished upload at the top of the list and
    /// focus it.
    pub fn create_conversation(&mut self, seed: ConversationSeed) -> Result<&Conversation> {
        if self.owner.is_none() {
            return Err(DocChatError::NotSignedIn);
        }

        let conv = Conversation::from_seed(seed, Utc::now());
        if let Some(existing) = self.index_of(&conv.id) {
            warn!("Replacing conversation {} with a new upload", conv.id);
            self.chats.remove(existing);
        }

        info!("New conversation {} for {}", conv.id, conv.document_name());
        self.focused = Some(conv.id.clone());
        self.chats.insert(0, conv);
        self.persist()?;
        Ok(&self.chats[0])
    }

    /// Validate and upload a document, then start a conversation about it.
    pub async fn upload(&mut self, path: &Path) -> Result<&Conversation> {
        let owner = self.owner.clone().ok_or(DocChatError::NotSignedIn)?;
        let (ext, size) = validate_document(path, &self.upload)?;

        let mut seed = self
            .backend
            .create_chat(path, &owner)
            .await
            .map_err(|e| DocChatError::Upload(e.user_message()))?;

        if seed.doc_type.as_deref().map_or(true, |t| t.trim().is_empty()) {
            seed.doc_type = Some(ext);
        }
        if seed.size.is_none() {
            seed.size = Some(size);
        }
        self.create_conversation(seed)
    }

    /// Ask a question in the focused conversation.
    ///
    /// Returns `Ok(None)` without touching anything when nothing is focused.
    /// The reply is appended only after the server answered; on failure the
    /// state is left as it was.
    pub async fn send_message(&mut self, text: &str) -> Result<Option<&Message>> {
        let Some(chat_id) = self.focused.clone() else {
            debug!("send_message with no focused conversation");
            return Ok(None);
        };

        let reply = match self.backend.send_message(&chat_id, text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Sending message to {} failed: {}", chat_id, e);
                return Err(DocChatError::Messaging(e.user_message()));
            }
        };

        // The conversation may have been removed while the request was out.
        let Some(idx) = self.index_of(&chat_id) else {
            warn!("Reply for {} arrived after it was removed", chat_id);
            return Ok(None);
        };

        let conv = &mut self.chats[idx];
        conv.messages.push(reply);
        conv.timestamp = Utc::now();
        self.persist()?;
        Ok(self.chats[idx].messages.last())
    }

    /// Delete a conversation on the server, then locally.
    pub async fn delete_conversation(&mut self, id: &str) -> Result<()> {
        let owner = self.owner.clone().ok_or(DocChatError::NotSignedIn)?;

        if let Err(e) = self.backend.delete_chat(id, &owner).await {
            warn!("Deleting conversation {} failed: {}", id, e);
            return Err(DocChatError::Deletion(e.user_message()));
        }

        if let Some(idx) = self.index_of(id) {
            self.chats.remove(idx);
        }
        if self.focused.as_deref() == Some(id) {
            self.focused = None;
        }

        info!("Deleted conversation {}", id);
        self.persist()
    }

    pub fn get_conversation(&self, id: &str) -> Option<&Conversation> {
        self.chats.iter().find(|c| c.id == id)
    }

    /// All conversations, newest first.
    pub fn conversations(&self) -> &[Conversation] {
        &self.chats
    }

    pub fn focused(&self) -> Option<&Conversation> {
        self.focused.as_deref().and_then(|id| self.get_conversation(id))
    }

    pub fn focused_id(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Focus a known conversation. Returns false (and changes nothing) for an
    /// unknown id.
    pub fn focus(&mut self, id: &str) -> bool {
        if self.index_of(id).is_some() {
            self.focused = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    /// Conversations whose document name contains `term`, case-insensitively.
    pub fn search(&self, term: &str) -> Vec<&Conversation> {
        let term = term.trim().to_lowercase();
        self.chats
            .iter()
            .filter(|c| term.is_empty() || c.document_name().to_lowercase().contains(&term))
            .collect()
    }

    /// Dashboard figures, with "today" judged in local time.
    pub fn stats(&self, today: NaiveDate) -> ChatStats {
        ChatStats {
            conversations: self.chats.len(),
            messages: self.chats.iter().map(|c| c.messages.len()).sum(),
            today: self
                .chats
                .iter()
                .filter(|c| c.timestamp.with_timezone(&Local).date_naive() == today)
                .count(),
            last_activity: self.chats.iter().map(|c| c.timestamp).max(),
        }
    }
}
