//! Data models for users, conversations and messages.

pub mod conversation;
pub mod message;
pub mod timestamp;
pub mod user;

pub use conversation::{Conversation, ConversationSeed};
pub use message::Message;
pub use user::User;
