//! Session store - the signed-in identity and its persistence lifecycle.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::api_client::Backend;
use super::chat_store::conversations_from_values;
use super::local_store::{chats_key, LocalStore, USER_KEY};
use crate::error::{DocChatError, Result, StorageError};
use crate::models::User;

/// Acknowledgement shown after a signup the server accepted without comment.
pub const SIGNUP_ACK: &str = "Account created. Check your email for a verification link.";

/// Holds the authenticated identity.
pub struct SessionStore {
    local: LocalStore,
    backend: Arc<dyn Backend>,
    user: Option<User>,
}

impl SessionStore {
    /// Create a store with no session. Call `restore` to resume one.
    pub fn new(local: LocalStore, backend: Arc<dyn Backend>) -> Self {
        Self {
            local,
            backend,
            user: None,
        }
    }

    /// Resume the persisted identity, if any. No network call.
    pub fn restore(&mut self) -> Result<Option<&User>> {
        match self.local.get_json::<User>(USER_KEY) {
            Ok(Some(user)) => {
                info!("Resumed session for {}", user.email);
                self.user = Some(user);
            }
            Ok(None) => debug!("No stored session"),
            Err(StorageError::Json(e)) => {
                warn!("Discarding unreadable stored session: {}", e);
                self.local.remove_item(USER_KEY)?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(self.user.as_ref())
    }

    /// Sign in. Credentials are assumed non-empty; the form checks that.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&User> {
        let response = self
            .backend
            .login(email, password)
            .await
            .map_err(|e| DocChatError::Authentication(e.user_message()))?;

        let (user, chats) = response.into_parts();
        self.local.set_json(USER_KEY, &user)?;
        if let Some(chats) = chats {
            let embedded = chats.len();
            let conversations = conversations_from_values(chats);
            debug!("Login carried {} of {} usable conversations", conversations.len(), embedded);
            // A list of bare ids says nothing about the stored records.
            if embedded == 0 || !conversations.is_empty() {
                self.local.set_json(&chats_key(&user.id), &conversations)?;
            }
        }

        info!("Signed in as {}", user.email);
        Ok(&*self.user.insert(user))
    }

    /// Register an account. Does not sign in: the email must be verified first.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<String> {
        let ack = self
            .backend
            .signup(name, email, password)
            .await
            .map_err(|e| DocChatError::Registration(e.user_message()))?;

        info!("Registered {}", email);
        Ok(ack.unwrap_or_else(|| SIGNUP_ACK.to_string()))
    }

    /// Complete email verification and sign in as the verified user.
    pub async fn verify(&mut self, token: &str) -> Result<&User> {
        let mut user = self
            .backend
            .verify(token)
            .await
            .map_err(|e| DocChatError::Verification(e.user_message()))?;

        user.verified = true;
        user.chats = None;
        self.local.set_json(USER_KEY, &user)?;

        info!("Verified {}", user.email);
        Ok(&*self.user.insert(user))
    }

    /// Sign out. Always clears the in-memory identity, then erases the stored
    /// identity and conversation list.
    pub fn logout(&mut self) -> Result<()> {
        let user = self.user.take();
        if let Some(user) = &user {
            info!("Signing out {}", user.email);
        }

        let identity = self.local.remove_item(USER_KEY);
        let chats = match &user {
            Some(user) => self.local.remove_item(&chats_key(&user.id)),
            None => Ok(()),
        };
        identity?;
        chats?;
        Ok(())
    }

    pub fn current(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}
