//! Single-line text field shared by the forms and the chat prompt.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::services::Theme;

#[derive(Debug, Default, Clone)]
pub struct TextInput {
    value: String,
    /// Cursor position in chars
    cursor: usize,
    masked: bool,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// A field that renders as bullets.
    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Apply an editing key. Returns false for keys the field does not use.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let len = self.value.chars().count();
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => self.clear(),
            (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => {
                let at = self.byte_index();
                self.value.insert(at, c);
                self.cursor += 1;
            }
            (_, KeyCode::Backspace) => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index();
                    self.value.remove(at);
                }
            }
            (_, KeyCode::Delete) => {
                if self.cursor < len {
                    let at = self.byte_index();
                    self.value.remove(at);
                }
            }
            (_, KeyCode::Left) => self.cursor = self.cursor.saturating_sub(1),
            (_, KeyCode::Right) => self.cursor = (self.cursor + 1).min(len),
            (_, KeyCode::Home) => self.cursor = 0,
            (_, KeyCode::End) => self.cursor = len,
            _ => return false,
        }
        true
    }

    /// Bordered paragraph with a block cursor when focused.
    pub fn widget<'a>(&'a self, title: &'a str, focused: bool, theme: &Theme) -> Paragraph<'a> {
        let shown: String = if self.masked {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        };

        let line = if focused {
            let before: String = shown.chars().take(self.cursor).collect();
            let at: String = shown.chars().skip(self.cursor).take(1).collect();
            let after: String = shown.chars().skip(self.cursor + 1).collect();
            Line::from(vec![
                Span::raw(before),
                Span::styled(
                    if at.is_empty() { " ".to_string() } else { at },
                    Style::default().add_modifier(Modifier::REVERSED),
                ),
                Span::raw(after),
            ])
        } else {
            Line::from(shown)
        };

        Paragraph::new(line)
            .style(Style::default().fg(theme.text))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(if focused {
                        theme.accent
                    } else {
                        theme.muted
                    })),
            )
    }
}
