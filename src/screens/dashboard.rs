//! Dashboard screen - stats, search and the conversation list.

use async_trait::async_trait;
use chrono::{Local, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use ratatui_garnish::{shadow::HalfShadow, GarnishableStatefulWidget, GarnishableWidget};

use crate::models::Conversation;
use crate::utils::{relative_time, truncate};

use super::input::TextInput;
use super::{Route, Screen, ScreenAction, ViewContext};

pub struct DashboardScreen {
    search: TextInput,
    searching: bool,
    list_state: ListState,
    /// Conversation awaiting y/n confirmation
    pending_delete: Option<String>,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self {
            search: TextInput::new(),
            searching: false,
            list_state: ListState::default(),
            pending_delete: None,
        }
    }

    fn visible<'a>(&self, ctx: &'a ViewContext<'_>) -> Vec<&'a Conversation> {
        ctx.chats.search(self.search.value())
    }

    fn selected_id(&self, ctx: &ViewContext<'_>) -> Option<String> {
        self.list_state
            .selected()
            .and_then(|i| self.visible(ctx).get(i).map(|c| c.id.clone()))
    }

    /// Keep the selection inside the visible list.
    fn clamp_selection(&mut self, len: usize) {
        let selected = match (len, self.list_state.selected()) {
            (0, _) => None,
            (_, None) => Some(0),
            (n, Some(i)) => Some(i.min(n - 1)),
        };
        self.list_state.select(selected);
    }

    fn move_by(&mut self, len: usize, down: bool) {
        if len == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0);
        let next = match (down, current) {
            (true, i) if i + 1 >= len => 0,
            (true, i) => i + 1,
            (false, 0) => len - 1,
            (false, i) => i - 1,
        };
        self.list_state.select(Some(next));
    }

    fn handle_search_key(&mut self, key: KeyEvent, ctx: &ViewContext<'_>) -> ScreenAction {
        match key.code {
            KeyCode::Esc => {
                self.search.clear();
                self.searching = false;
            }
            KeyCode::Enter | KeyCode::Down => self.searching = false,
            _ => {
                self.search.handle_key(key);
            }
        }
        let len = self.visible(ctx).len();
        self.clamp_selection(len);
        ScreenAction::None
    }

    fn draw_stats(&self, f: &mut Frame, area: Rect, ctx: &ViewContext<'_>) {
        let theme = ctx.theme;
        let stats = ctx.chats.stats(Local::now().date_naive());
        let last = stats
            .last_activity
            .map(|ts| relative_time(ts, Utc::now(), &ctx.config.display.date_format))
            .unwrap_or_else(|| "never".to_string());

        let cards = [
            ("Conversations", stats.conversations.to_string()),
            ("Questions asked", stats.messages.to_string()),
            ("Active today", stats.today.to_string()),
            ("Last activity", last),
        ];

        let (greeting, unverified) = match ctx.session.current() {
            Some(user) => (format!("Welcome, {}", user.display_name()), !user.verified),
            None => (String::new(), false),
        };
        let mut title = vec![Span::styled(greeting, Style::default().fg(theme.text))];
        if unverified {
            title.push(Span::styled(
                "  email not verified, run with --verify <TOKEN>",
                Style::default().fg(theme.error),
            ));
        }
        let outer = Block::default().title(Line::from(title));
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(inner);

        for ((label, value), chunk) in cards.into_iter().zip(chunks.iter()) {
            let card = Paragraph::new(vec![
                Line::styled(
                    value,
                    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
                ),
                Line::styled(label, Style::default().fg(theme.muted)),
            ])
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.muted)))
            .garnish(HalfShadow::default());
            f.render_widget(card, *chunk);
        }
    }
}

#[async_trait]
impl Screen for DashboardScreen {
    fn draw(&mut self, f: &mut Frame, area: Rect, ctx: &ViewContext<'_>) {
        let theme = ctx.theme;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // Stat cards
                Constraint::Length(3), // Search
                Constraint::Min(0),    // Conversations
            ])
            .split(area);

        self.draw_stats(f, chunks[0], ctx);

        let search_title = if self.searching {
            "Search documents (Enter to keep, Esc to clear)"
        } else {
            "Search documents (/)"
        };
        f.render_widget(self.search.widget(search_title, self.searching, theme), chunks[1]);

        let visible = self.visible(ctx);
        let now = Utc::now();
        let items: Vec<ListItem> = visible
            .iter()
            .map(|c| {
                let questions = match c.messages.len() {
                    1 => "1 question".to_string(),
                    n => format!("{} questions", n),
                };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<10}", relative_time(c.timestamp, now, &ctx.config.display.date_format)),
                        Style::default().fg(theme.muted),
                    ),
                    Span::raw("  "),
                    Span::styled(
                        format!("{:<8}", c.type_label()),
                        Style::default().fg(theme.accent),
                    ),
                    Span::styled(truncate(c.document_name(), 48), Style::default().fg(theme.text)),
                    Span::styled(format!("  ({})", questions), Style::default().fg(theme.muted)),
                ]))
            })
            .collect();

        let title = if self.search.is_blank() {
            format!("Conversations ({})", visible.len())
        } else {
            format!("Conversations ({} of {})", visible.len(), ctx.chats.conversations().len())
        };
        let empty = items.is_empty();

        let list_block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(if self.searching { theme.muted } else { theme.accent }));

        if empty {
            let hint = if ctx.chats.conversations().is_empty() {
                "No conversations yet. Press n to upload a document."
            } else {
                "No documents match your search."
            };
            f.render_widget(
                Paragraph::new(hint)
                    .style(Style::default().fg(theme.muted))
                    .block(list_block),
                chunks[2],
            );
            return;
        }

        let list = List::new(items)
            .block(list_block)
            .highlight_style(
                Style::default()
                    .bg(theme.selection)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("► ");

        let garnished = GarnishableStatefulWidget::garnish(list, HalfShadow::default());
        f.render_stateful_widget(garnished, chunks[2], &mut self.list_state);
    }

    async fn handle_key(&mut self, key: KeyEvent, ctx: &ViewContext<'_>) -> ScreenAction {
        if self.searching {
            return self.handle_search_key(key, ctx);
        }

        if let Some(id) = self.pending_delete.take() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => ScreenAction::Delete(id),
                _ => ScreenAction::Status("Delete cancelled".to_string()),
            };
        }

        let len = self.visible(ctx).len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_by(len, false);
                ScreenAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_by(len, true);
                ScreenAction::None
            }
            KeyCode::Char('/') => {
                self.searching = true;
                ScreenAction::None
            }
            KeyCode::Esc if !self.search.is_blank() => {
                self.search.clear();
                self.clamp_selection(self.visible(ctx).len());
                ScreenAction::None
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => match self.selected_id(ctx) {
                Some(id) => ScreenAction::Navigate(Route::Chat(Some(id))),
                None => ScreenAction::None,
            },
            KeyCode::Char('n') => ScreenAction::Navigate(Route::Chat(None)),
            KeyCode::Char('d') | KeyCode::Delete => {
                let Some(id) = self.selected_id(ctx) else {
                    return ScreenAction::None;
                };
                let name = ctx
                    .chats
                    .get_conversation(&id)
                    .map(|c| c.document_name().to_string())
                    .unwrap_or_default();
                self.pending_delete = Some(id);
                ScreenAction::Status(format!("Delete chat for {}? (y/n)", name))
            }
            KeyCode::Char('L') => ScreenAction::Logout,
            KeyCode::Char('q') => ScreenAction::Quit,
            _ => ScreenAction::None,
        }
    }

    fn enter(&mut self, ctx: &ViewContext<'_>) {
        self.pending_delete = None;
        self.searching = false;
        let len = self.visible(ctx).len();
        self.clamp_selection(len);
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("j/k", "Nav"),
            ("Enter", "Open"),
            ("n", "New chat"),
            ("/", "Search"),
            ("d", "Delete"),
            ("L", "Log out"),
            ("q", "Quit"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, UploadConfig};
    use crate::services::testing::{self, FakeBackend};
    use crate::services::{ChatStore, LocalStore, SessionStore, Theme};
    use crossterm::event::KeyModifiers;
    use std::sync::Arc;

    struct Fixture {
        session: SessionStore,
        chats: ChatStore,
        theme: Theme,
        config: Config,
    }

    impl Fixture {
        fn new(names: &[&str]) -> Self {
            let local = LocalStore::in_memory().unwrap();
            let backend = Arc::new(FakeBackend::new());
            let session = SessionStore::new(local.clone(), backend.clone());
            let mut chats = ChatStore::new(local, backend, UploadConfig::default());
            let owner = testing::user("u1", "a@b.com");
            chats.restore(Some(&owner)).unwrap();
            for name in names {
                chats.create_conversation(testing::seed(name)).unwrap();
            }
            Self {
                session,
                chats,
                theme: Theme::default(),
                config: Config::default(),
            }
        }

        fn ctx(&self) -> ViewContext<'_> {
            ViewContext {
                session: &self.session,
                chats: &self.chats,
                theme: &self.theme,
                config: &self.config,
            }
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_open_selected_conversation() {
        let fx = Fixture::new(&["alpha", "beta"]);
        let mut screen = DashboardScreen::new();
        screen.enter(&fx.ctx());

        // Newest first: beta, alpha
        let action = screen.handle_key(key(KeyCode::Down), &fx.ctx()).await;
        assert_eq!(action, ScreenAction::None);
        let action = screen.handle_key(key(KeyCode::Enter), &fx.ctx()).await;
        assert_eq!(action, ScreenAction::Navigate(Route::Chat(Some("alpha".into()))));
    }

    #[tokio::test]
    async fn test_search_filters_selection() {
        let fx = Fixture::new(&["alpha", "beta"]);
        let mut screen = DashboardScreen::new();
        screen.enter(&fx.ctx());

        screen.handle_key(key(KeyCode::Char('/')), &fx.ctx()).await;
        for c in "ALP".chars() {
            screen.handle_key(key(KeyCode::Char(c)), &fx.ctx()).await;
        }
        screen.handle_key(key(KeyCode::Enter), &fx.ctx()).await;

        let action = screen.handle_key(key(KeyCode::Enter), &fx.ctx()).await;
        assert_eq!(action, ScreenAction::Navigate(Route::Chat(Some("alpha".into()))));
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let fx = Fixture::new(&["alpha"]);
        let mut screen = DashboardScreen::new();
        screen.enter(&fx.ctx());

        let action = screen.handle_key(key(KeyCode::Char('d')), &fx.ctx()).await;
        assert!(matches!(action, ScreenAction::Status(_)));
        let action = screen.handle_key(key(KeyCode::Char('n')), &fx.ctx()).await;
        assert_eq!(action, ScreenAction::Status("Delete cancelled".to_string()));

        screen.handle_key(key(KeyCode::Char('d')), &fx.ctx()).await;
        let action = screen.handle_key(key(KeyCode::Char('y')), &fx.ctx()).await;
        assert_eq!(action, ScreenAction::Delete("alpha".to_string()));
    }

    #[tokio::test]
    async fn test_empty_list_keys_are_noops() {
        let fx = Fixture::new(&[]);
        let mut screen = DashboardScreen::new();
        screen.enter(&fx.ctx());
        assert_eq!(screen.handle_key(key(KeyCode::Enter), &fx.ctx()).await, ScreenAction::None);
        assert_eq!(screen.handle_key(key(KeyCode::Char('d')), &fx.ctx()).await, ScreenAction::None);
        assert_eq!(
            screen.handle_key(key(KeyCode::Char('n')), &fx.ctx()).await,
            ScreenAction::Navigate(Route::Chat(None))
        );
    }
}
