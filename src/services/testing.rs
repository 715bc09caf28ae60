//! In-process backend for store tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::api_client::{Backend, LoginResponse};
use crate::error::ApiError;
use crate::models::{ConversationSeed, Message, User};

/// A call the fake backend received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login(String),
    Signup(String),
    Verify(String),
    CreateChat(PathBuf, String),
    SendMessage(String, String),
    DeleteChat(String, String),
}

/// Scripted backend: each endpoint pops its next queued reply.
#[derive(Default)]
pub struct FakeBackend {
    pub calls: Mutex<Vec<Call>>,
    login: Mutex<VecDeque<Result<LoginResponse, ApiError>>>,
    signup: Mutex<VecDeque<Result<Option<String>, ApiError>>>,
    verify: Mutex<VecDeque<Result<User, ApiError>>>,
    create: Mutex<VecDeque<Result<ConversationSeed, ApiError>>>,
    message: Mutex<VecDeque<Result<Message, ApiError>>>,
    delete: Mutex<VecDeque<Result<(), ApiError>>>,
}

pub fn status(code: u16, message: &str) -> ApiError {
    ApiError::Status {
        status: code,
        message: message.to_string(),
    }
}

pub fn user(id: &str, email: &str) -> User {
    User {
        id: id.to_string(),
        name: email.split('@').next().unwrap_or_default().to_string(),
        email: email.to_string(),
        verified: false,
        chats: None,
    }
}

pub fn seed(id: &str) -> ConversationSeed {
    ConversationSeed {
        id: id.to_string(),
        doc_summary: "s".to_string(),
        size: Some(1000),
        doc_type: Some("pdf".to_string()),
        document_path: format!("/d/{}.pdf", id),
    }
}

pub fn message(id: &str, text: &str, answer: &str) -> Message {
    serde_json::from_value(serde_json::json!({ "id": id, "text": text, "answer": answer }))
        .expect("valid message")
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_login(self, reply: Result<(User, Option<Vec<Value>>), ApiError>) -> Self {
        let reply = reply.map(|(mut user, chats)| {
            user.chats = chats;
            LoginResponse { user, chats: None }
        });
        self.login.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_signup(self, reply: Result<Option<String>, ApiError>) -> Self {
        self.signup.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_verify(self, reply: Result<User, ApiError>) -> Self {
        self.verify.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_create(self, reply: Result<ConversationSeed, ApiError>) -> Self {
        self.create.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_message(self, reply: Result<Message, ApiError>) -> Self {
        self.message.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_delete(self, reply: Result<(), ApiError>) -> Self {
        self.delete.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn next<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>, endpoint: &str) -> Result<T, ApiError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(status(500, &format!("no scripted reply for {}", endpoint))))
}

#[async_trait]
impl Backend for FakeBackend {
    async fn login(&self, email: &str, _password: &str) -> Result<LoginResponse, ApiError> {
        self.record(Call::Login(email.to_string()));
        next(&self.login, "login")
    }

    async fn signup(
        &self,
        _name: &str,
        email: &str,
        _password: &str,
    ) -> Result<Option<String>, ApiError> {
        self.record(Call::Signup(email.to_string()));
        next(&self.signup, "signup")
    }

    async fn verify(&self, token: &str) -> Result<User, ApiError> {
        self.record(Call::Verify(token.to_string()));
        next(&self.verify, "verify")
    }

    async fn create_chat(&self, file: &Path, user_id: &str) -> Result<ConversationSeed, ApiError> {
        self.record(Call::CreateChat(file.to_path_buf(), user_id.to_string()));
        next(&self.create, "create_chat")
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<Message, ApiError> {
        self.record(Call::SendMessage(chat_id.to_string(), text.to_string()));
        next(&self.message, "send_message")
    }

    async fn delete_chat(&self, chat_id: &str, user_id: &str) -> Result<(), ApiError> {
        self.record(Call::DeleteChat(chat_id.to_string(), user_id.to_string()));
        next(&self.delete, "delete_chat")
    }
}
