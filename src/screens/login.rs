//! Login screen.

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use ratatui_garnish::{shadow::HalfShadow, GarnishableWidget, Padding};

use crate::services::banner;

use super::input::TextInput;
use super::{centered, Outcome, Route, Screen, ScreenAction, ViewContext};

pub const FILL_ALL_FIELDS: &str = "Please fill in all fields";

/// Both fields are required.
pub fn validate_login(email: &str, password: &str) -> Result<(), &'static str> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(FILL_ALL_FIELDS);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Email,
    Password,
}

pub struct LoginScreen {
    email: TextInput,
    password: TextInput,
    field: Field,
    error: Option<String>,
    /// Success text carried over from signup or verification
    notice: Option<String>,
    banner: &'static str,
}

impl LoginScreen {
    pub fn new() -> Self {
        Self {
            email: TextInput::new(),
            password: TextInput::masked(),
            field: Field::Email,
            error: None,
            notice: None,
            banner: banner::random_banner(),
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            Field::Email => Field::Password,
            Field::Password => Field::Email,
        };
    }

    fn submit(&mut self) -> ScreenAction {
        self.error = None;
        if let Err(msg) = validate_login(self.email.value(), self.password.value()) {
            self.error = Some(msg.to_string());
            return ScreenAction::None;
        }
        ScreenAction::Login {
            email: self.email.value().trim().to_string(),
            password: self.password.value().to_string(),
        }
    }
}

#[async_trait]
impl Screen for LoginScreen {
    fn draw(&mut self, f: &mut Frame, area: Rect, ctx: &ViewContext<'_>) {
        let theme = ctx.theme;
        let banner_height = self.banner.lines().count() as u16 + 2;
        let form = centered(area, 56, banner_height + 12);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(banner_height), // Banner
                Constraint::Length(3),             // Email
                Constraint::Length(3),             // Password
                Constraint::Length(2),             // Error / notice
                Constraint::Min(0),
            ])
            .split(form);

        let art = Paragraph::new(format!("{}\n{}", self.banner.trim_end(), banner::TAGLINE))
            .style(Style::default().fg(theme.accent))
            .block(Block::default().borders(Borders::ALL).title("Sign in"))
            .garnish(Padding::horizontal(1))
            .garnish(HalfShadow::default());
        f.render_widget(art, chunks[0]);

        f.render_widget(
            self.email.widget("Email", self.field == Field::Email, theme),
            chunks[1],
        );
        f.render_widget(
            self.password
                .widget("Password", self.field == Field::Password, theme),
            chunks[2],
        );

        let feedback = match (&self.error, &self.notice) {
            (Some(err), _) => Line::styled(err.as_str(), Style::default().fg(theme.error)),
            (None, Some(notice)) => Line::styled(notice.as_str(), Style::default().fg(theme.success)),
            (None, None) => Line::default(),
        };
        f.render_widget(Paragraph::new(feedback), chunks[3]);
    }

    async fn handle_key(&mut self, key: KeyEvent, _ctx: &ViewContext<'_>) -> ScreenAction {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => ScreenAction::Navigate(Route::Signup),
            (_, KeyCode::Tab) | (_, KeyCode::Down) | (_, KeyCode::Up) | (_, KeyCode::BackTab) => {
                self.next_field();
                ScreenAction::None
            }
            (_, KeyCode::Enter) => self.submit(),
            _ => {
                let field = match self.field {
                    Field::Email => &mut self.email,
                    Field::Password => &mut self.password,
                };
                field.handle_key(key);
                ScreenAction::None
            }
        }
    }

    fn enter(&mut self, _ctx: &ViewContext<'_>) {
        self.password.clear();
        self.error = None;
        self.field = if self.email.is_blank() {
            Field::Email
        } else {
            Field::Password
        };
    }

    fn notify(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Done => {
                self.email.clear();
                self.password.clear();
                self.error = None;
                self.notice = None;
            }
            Outcome::Failed(msg) => {
                self.password.clear();
                self.notice = None;
                self.error = Some(msg);
            }
            Outcome::Notice(msg) => {
                self.error = None;
                self.notice = Some(msg);
            }
        }
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("Tab", "Next field"), ("Enter", "Sign in"), ("^S", "Create account"), ("^C", "Quit")]
    }
}
