//! Chat screen - sidebar, transcript and question prompt.
//!
//! With no conversation focused the main pane becomes the upload prompt.

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use ratatui_garnish::{
    shadow::HalfShadow, GarnishableStatefulWidget, GarnishableWidget, Padding,
};
use std::path::PathBuf;

use crate::config::expand_path;
use crate::models::Conversation;
use crate::services::Theme;
use crate::utils::{format_file_size, single_line, truncate};

use super::input::TextInput;
use super::{Outcome, Route, Screen, ScreenAction, ViewContext};

/// Which pane has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Sidebar,
    Input,
}

/// Turn typed or pasted text into a document path. Strips the quotes some
/// terminals add when a file is dropped in.
pub fn parse_upload_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim().trim_matches(|c| c == '\'' || c == '"').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(expand_path(trimmed)))
    }
}

/// Rough number of terminal rows `lines` take when wrapped to `width`.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    lines
        .iter()
        .map(|l| l.width().max(1).div_ceil(width))
        .sum::<usize>()
        .min(usize::from(u16::MAX)) as u16
}

pub struct ChatScreen {
    pane: Pane,
    input: TextInput,
    sidebar_state: ListState,
    show_info: bool,
    /// Rows scrolled up from the bottom of the transcript
    scroll_back: u16,
    error: Option<String>,
    /// Conversation the input belongs to
    shown: Option<String>,
    pending_delete: Option<String>,
}

impl ChatScreen {
    pub fn new() -> Self {
        Self {
            pane: Pane::Input,
            input: TextInput::new(),
            sidebar_state: ListState::default(),
            show_info: false,
            scroll_back: 0,
            error: None,
            shown: None,
            pending_delete: None,
        }
    }

    fn selected_id(&self, ctx: &ViewContext<'_>) -> Option<String> {
        self.sidebar_state
            .selected()
            .and_then(|i| ctx.chats.conversations().get(i))
            .map(|c| c.id.clone())
    }

    fn move_selection(&mut self, len: usize, down: bool) {
        if len == 0 {
            return;
        }
        let i = self.sidebar_state.selected().unwrap_or(0);
        let next = if down { (i + 1) % len } else { (i + len - 1) % len };
        self.sidebar_state.select(Some(next));
    }

    fn submit(&mut self, ctx: &ViewContext<'_>) -> ScreenAction {
        self.error = None;
        if ctx.chats.focused().is_some() {
            let text = self.input.value().trim();
            if text.is_empty() {
                return ScreenAction::None;
            }
            ScreenAction::Send(text.to_string())
        } else {
            match parse_upload_path(self.input.value()) {
                Some(path) => ScreenAction::Upload(path),
                None => {
                    self.error = Some("Enter the path of a document to upload".to_string());
                    ScreenAction::None
                }
            }
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent, ctx: &ViewContext<'_>) -> ScreenAction {
        if let Some(id) = self.pending_delete.take() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => ScreenAction::Delete(id),
                _ => ScreenAction::Status("Delete cancelled".to_string()),
            };
        }

        let len = ctx.chats.conversations().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(len, false);
                ScreenAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(len, true);
                ScreenAction::None
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => match self.selected_id(ctx) {
                Some(id) => ScreenAction::Navigate(Route::Chat(Some(id))),
                None => ScreenAction::None,
            },
            KeyCode::Char('n') => ScreenAction::Navigate(Route::Chat(None)),
            KeyCode::Char('i') => {
                self.show_info = !self.show_info;
                ScreenAction::None
            }
            KeyCode::Char('y') => ScreenAction::CopyAnswer,
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
            _ => ScreenAction::None,
        }
    }

    fn draw_sidebar(&mut self, f: &mut Frame, area: Rect, ctx: &ViewContext<'_>) {
        let theme = ctx.theme;
        let focused_id = ctx.chats.focused_id();
        let items: Vec<ListItem> = ctx
            .chats
            .conversations()
            .iter()
            .map(|c| {
                let style = if Some(c.id.as_str()) == focused_id {
                    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme.text)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(truncate(c.document_name(), 28), style),
                    Span::styled(format!(" {}", c.messages.len()), Style::default().fg(theme.muted)),
                ]))
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Chats ({})", items.len()))
            .border_style(Style::default().fg(if self.pane == Pane::Sidebar {
                theme.accent
            } else {
                theme.muted
            }));

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(theme.selection).add_modifier(Modifier::BOLD))
            .highlight_symbol("► ");

        if self.pane == Pane::Sidebar {
            let garnished = GarnishableStatefulWidget::garnish(list, HalfShadow::default());
            f.render_stateful_widget(garnished, area, &mut self.sidebar_state);
        } else {
            f.render_stateful_widget(list, area, &mut self.sidebar_state);
        }
    }

    fn draw_info(&self, f: &mut Frame, area: Rect, conv: &Conversation, ctx: &ViewContext<'_>) {
        let theme = ctx.theme;
        let label = |name: &'static str| Span::styled(format!("{:<9}", name), Style::default().fg(theme.muted));
        let summary = if conv.doc_summary.trim().is_empty() {
            "No summary available".to_string()
        } else {
            single_line(&conv.doc_summary)
        };

        let lines = vec![
            Line::from(vec![label("Name"), Span::raw(conv.document_name().to_string())]),
            Line::from(vec![
                label("Type"),
                Span::raw(conv.type_label()),
                Span::styled("   Size ", Style::default().fg(theme.muted)),
                Span::raw(format_file_size(conv.size)),
            ]),
            Line::from(vec![
                label("Updated"),
                Span::raw(
                    conv.timestamp
                        .with_timezone(&chrono::Local)
                        .format(&ctx.config.display.datetime_format)
                        .to_string(),
                ),
            ]),
            Line::from(vec![label("Summary"), Span::raw(summary)]),
        ];

        let info = Paragraph::new(lines)
            .style(Style::default().fg(theme.text))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Document"))
            .garnish(Padding::horizontal(1))
            .garnish(HalfShadow::default());
        f.render_widget(info, area);
    }

    fn draw_transcript(&self, f: &mut Frame, area: Rect, conv: &Conversation, theme: &Theme, datetime_format: &str) {
        let mut lines: Vec<Line> = Vec::new();
        if conv.messages.is_empty() {
            lines.push(Line::styled(
                format!("Ask anything about {}.", conv.document_name()),
                Style::default().fg(theme.muted),
            ));
        }
        for msg in &conv.messages {
            let when = msg
                .timestamp
                .with_timezone(&chrono::Local)
                .format(datetime_format)
                .to_string();
            lines.push(Line::from(vec![
                Span::styled("You", Style::default().fg(theme.question).add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {}", when), Style::default().fg(theme.muted)),
            ]));
            lines.extend(msg.text.lines().map(|l| Line::styled(l.to_string(), Style::default().fg(theme.text))));
            lines.push(Line::styled(
                "Assistant",
                Style::default().fg(theme.answer).add_modifier(Modifier::BOLD),
            ));
            lines.extend(
                msg.answer_text()
                    .lines()
                    .map(|l| Line::styled(l.to_string(), Style::default().fg(theme.answer))),
            );
            lines.push(Line::default());
        }

        let inner_height = area.height.saturating_sub(2);
        let total = wrapped_height(&lines, area.width.saturating_sub(2));
        let bottom = total.saturating_sub(inner_height);
        let offset = bottom.saturating_sub(self.scroll_back);

        let transcript = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((offset, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("{} ({})", truncate(conv.document_name(), 40), conv.type_label())),
            );
        f.render_widget(transcript, area);
    }

    fn draw_upload_prompt(&self, f: &mut Frame, area: Rect, ctx: &ViewContext<'_>) {
        let theme = ctx.theme;
        let upload = &ctx.config.upload;
        let types = upload
            .allowed_types
            .iter()
            .map(|t| t.to_uppercase())
            .collect::<Vec<_>>()
            .join(", ");

        let text = vec![
            Line::styled(
                "Start a new chat",
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            ),
            Line::default(),
            Line::raw("Type or paste the path of a document below and press Enter."),
            Line::raw("It will be uploaded and summarized, then you can ask questions about it."),
            Line::default(),
            Line::styled(
                format!("Supported: {}   Max size: {}", types, format_file_size(upload.max_bytes)),
                Style::default().fg(theme.muted),
            ),
        ];

        let prompt = Paragraph::new(text)
            .style(Style::default().fg(theme.text))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Upload"))
            .garnish(Padding::horizontal(1))
            .garnish(HalfShadow::default());
        f.render_widget(prompt, area);
    }
}

#[async_trait]
impl Screen for ChatScreen {
    fn draw(&mut self, f: &mut Frame, area: Rect, ctx: &ViewContext<'_>) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
            .split(area);

        self.draw_sidebar(f, columns[0], ctx);

        let focused = ctx.chats.focused();
        let info_height = if self.show_info && focused.is_some() { 7 } else { 0 };
        let error_height = if self.error.is_some() { 1 } else { 0 };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(info_height),
                Constraint::Min(0),
                Constraint::Length(error_height),
                Constraint::Length(3),
            ])
            .split(columns[1]);

        let title = match focused {
            Some(conv) => {
                if info_height > 0 {
                    self.draw_info(f, rows[0], conv, ctx);
                }
                self.draw_transcript(f, rows[1], conv, ctx.theme, &ctx.config.display.datetime_format);
                "Ask a question"
            }
            None => {
                self.draw_upload_prompt(f, rows[1], ctx);
                "Document path"
            }
        };

        if let Some(err) = &self.error {
            f.render_widget(
                Paragraph::new(Line::styled(err.as_str(), Style::default().fg(ctx.theme.error))),
                rows[2],
            );
        }

        f.render_widget(
            self.input.widget(title, self.pane == Pane::Input, ctx.theme),
            rows[3],
        );
    }

    async fn handle_key(&mut self, key: KeyEvent, ctx: &ViewContext<'_>) -> ScreenAction {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) if self.pending_delete.is_none() => {
                return ScreenAction::Navigate(Route::Dashboard)
            }
            (_, KeyCode::Tab) | (_, KeyCode::BackTab) => {
                self.pending_delete = None;
                self.pane = match self.pane {
                    Pane::Sidebar => Pane::Input,
                    Pane::Input => Pane::Sidebar,
                };
                return ScreenAction::None;
            }
            (_, KeyCode::PageUp) => {
                self.scroll_back = self.scroll_back.saturating_add(5);
                return ScreenAction::None;
            }
            (_, KeyCode::PageDown) => {
                self.scroll_back = self.scroll_back.saturating_sub(5);
                return ScreenAction::None;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('d')) => {
                self.show_info = !self.show_info;
                return ScreenAction::None;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('y')) => return ScreenAction::CopyAnswer,
            (KeyModifiers::CONTROL, KeyCode::Char('n')) => {
                return ScreenAction::Navigate(Route::Chat(None))
            }
            _ => {}
        }

        match self.pane {
            Pane::Sidebar => self.handle_sidebar_key(key, ctx),
            Pane::Input => {
                if key.code == KeyCode::Enter {
                    return self.submit(ctx);
                }
                if self.input.handle_key(key) {
                    self.error = None;
                }
                ScreenAction::None
            }
        }
    }

    fn enter(&mut self, ctx: &ViewContext<'_>) {
        let current = ctx.chats.focused_id().map(str::to_string);
        if current != self.shown {
            self.input.clear();
            self.scroll_back = 0;
            self.shown = current;
        }
        self.error = None;
        self.pending_delete = None;
        self.pane = Pane::Input;

        let selected = match ctx.chats.focused_id() {
            Some(id) => ctx.chats.conversations().iter().position(|c| c.id == id),
            None if ctx.chats.conversations().is_empty() => None,
            None => Some(0),
        };
        self.sidebar_state.select(selected);
    }

    fn notify(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Done => {
                self.input.clear();
                self.scroll_back = 0;
                self.error = None;
            }
            Outcome::Failed(msg) => self.error = Some(msg),
            Outcome::Notice(_) => {}
        }
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        match self.pane {
            Pane::Input => &[
                ("Enter", "Send"),
                ("Tab", "Chats"),
                ("^D", "Doc info"),
                ("^Y", "Copy answer"),
                ("^N", "New chat"),
                ("Esc", "Dashboard"),
            ],
            Pane::Sidebar => &[
                ("j/k", "Nav"),
                ("Enter", "Open"),
                ("n", "New"),
                ("d", "Delete"),
                ("i", "Doc info"),
                ("y", "Copy answer"),
                ("Tab", "Prompt"),
            ],
        }
    }
}
