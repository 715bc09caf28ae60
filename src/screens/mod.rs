//! TUI screens.

pub mod chat;
pub mod dashboard;
pub mod input;
pub mod login;
pub mod signup;

pub use chat::ChatScreen;
pub use dashboard::DashboardScreen;
pub use login::LoginScreen;
pub use signup::SignupScreen;

use async_trait::async_trait;
use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::Frame;
use std::path::PathBuf;

use crate::config::Config;
use crate::services::{ChatStore, SessionStore, Theme};

/// Where the user is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    /// A conversation, or the upload prompt when `None`.
    Chat(Option<String>),
}

impl Route {
    fn requires_session(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Chat(_))
    }
}

/// Resolve a requested route against the session and the conversation list.
///
/// Sign-in pages bounce to the dashboard once signed in, everything else
/// bounces to the login page when signed out, and an unknown conversation
/// falls back to the dashboard.
pub fn guard(route: Route, signed_in: bool, exists: impl Fn(&str) -> bool) -> Route {
    match route {
        Route::Login | Route::Signup if signed_in => Route::Dashboard,
        r if r.requires_session() && !signed_in => Route::Login,
        Route::Chat(Some(id)) if !exists(&id) => Route::Dashboard,
        r => r,
    }
}

/// Action returned by screen key handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenAction {
    /// No action needed.
    None,
    /// Display a status message.
    Status(String),
    Navigate(Route),
    Login { email: String, password: String },
    Signup { name: String, email: String, password: String },
    Upload(PathBuf),
    Send(String),
    Delete(String),
    /// Copy the focused conversation's latest answer.
    CopyAnswer,
    Logout,
    Quit,
}

/// Result of an action, reported back to the screen that asked for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done,
    Failed(String),
    Notice(String),
}

/// Read-only view of application state handed to screens.
pub struct ViewContext<'a> {
    pub session: &'a SessionStore,
    pub chats: &'a ChatStore,
    pub theme: &'a Theme,
    pub config: &'a Config,
}

/// Trait for screen implementations.
#[async_trait]
pub trait Screen {
    /// Draw the screen.
    fn draw(&mut self, f: &mut Frame, area: Rect, ctx: &ViewContext<'_>);

    /// Handle a key event.
    async fn handle_key(&mut self, key: KeyEvent, ctx: &ViewContext<'_>) -> ScreenAction;

    /// Called when the screen becomes the active route.
    fn enter(&mut self, _ctx: &ViewContext<'_>) {}

    /// Feedback for the last action this screen returned.
    fn notify(&mut self, _outcome: Outcome) {}

    /// Key hints for the status bar.
    fn hints(&self) -> &'static [(&'static str, &'static str)];
}

/// A `width` x `height` rect centered in `area`, clamped to fit.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(id: &str) -> bool {
        id == "c1"
    }

    #[test]
    fn test_guard_signed_out() {
        assert_eq!(guard(Route::Login, false, known), Route::Login);
        assert_eq!(guard(Route::Signup, false, known), Route::Signup);
        assert_eq!(guard(Route::Dashboard, false, known), Route::Login);
        assert_eq!(guard(Route::Chat(None), false, known), Route::Login);
        assert_eq!(guard(Route::Chat(Some("c1".into())), false, known), Route::Login);
    }

    #[test]
    fn test_guard_signed_in() {
        assert_eq!(guard(Route::Login, true, known), Route::Dashboard);
        assert_eq!(guard(Route::Signup, true, known), Route::Dashboard);
        assert_eq!(guard(Route::Dashboard, true, known), Route::Dashboard);
        assert_eq!(guard(Route::Chat(None), true, known), Route::Chat(None));
        assert_eq!(
            guard(Route::Chat(Some("c1".into())), true, known),
            Route::Chat(Some("c1".into()))
        );
        assert_eq!(guard(Route::Chat(Some("gone".into())), true, known), Route::Dashboard);
    }

    #[test]
    fn test_centered_clamps() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered(area, 20, 4), Rect::new(10, 3, 20, 4));
        assert_eq!(centered(area, 100, 100), area);
    }
}
