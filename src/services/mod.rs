//! Backend services.

pub mod api_client;
pub mod banner;
pub mod chat_store;
pub mod clipboard;
pub mod local_store;
pub mod session_store;
pub mod theme;

#[cfg(test)]
pub mod testing;

pub use api_client::{ApiClient, Backend};
pub use chat_store::ChatStore;
pub use clipboard::copy_to_clipboard;
pub use local_store::LocalStore;
pub use session_store::SessionStore;
pub use theme::Theme;
