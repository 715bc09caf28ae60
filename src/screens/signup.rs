//! Account creation screen.

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use ratatui_garnish::{shadow::HalfShadow, GarnishableWidget, Padding};

use super::input::TextInput;
use super::login::FILL_ALL_FIELDS;
use super::{centered, Outcome, Route, Screen, ScreenAction, ViewContext};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Checks run before the request is sent, in this order.
pub fn validate_signup(
    name: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), &'static str> {
    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() || confirm.is_empty()
    {
        return Err(FILL_ALL_FIELDS);
    }
    if password != confirm {
        return Err("Passwords do not match");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 6 characters long");
    }
    Ok(())
}

const LABELS: [&str; 4] = ["Full name", "Email", "Password", "Confirm password"];

pub struct SignupScreen {
    /// name, email, password, confirmation
    fields: [TextInput; 4],
    field: usize,
    error: Option<String>,
}

impl SignupScreen {
    pub fn new() -> Self {
        Self {
            fields: [
                TextInput::new(),
                TextInput::new(),
                TextInput::masked(),
                TextInput::masked(),
            ],
            field: 0,
            error: None,
        }
    }

    fn submit(&mut self) -> ScreenAction {
        self.error = None;
        let [name, email, password, confirm] = &self.fields;
        if let Err(msg) = validate_signup(name.value(), email.value(), password.value(), confirm.value()) {
            self.error = Some(msg.to_string());
            return ScreenAction::None;
        }
        ScreenAction::Signup {
            name: name.value().trim().to_string(),
            email: email.value().trim().to_string(),
            password: password.value().to_string(),
        }
    }
}

#[async_trait]
impl Screen for SignupScreen {
    fn draw(&mut self, f: &mut Frame, area: Rect, ctx: &ViewContext<'_>) {
        let theme = ctx.theme;
        let form = centered(area, 56, 20);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(form);

        let heading = Paragraph::new("Create an account to start chatting with your documents.")
            .style(Style::default().fg(theme.accent))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Sign up"))
            .garnish(Padding::horizontal(1))
            .garnish(HalfShadow::default());
        f.render_widget(heading, chunks[0]);

        for (i, (input, label)) in self.fields.iter().zip(LABELS).enumerate() {
            f.render_widget(input.widget(label, self.field == i, theme), chunks[i + 1]);
        }

        if let Some(err) = &self.error {
            f.render_widget(
                Paragraph::new(Line::styled(err.as_str(), Style::default().fg(theme.error)))
                    .wrap(Wrap { trim: true }),
                chunks[5],
            );
        }
    }

    async fn handle_key(&mut self, key: KeyEvent, _ctx: &ViewContext<'_>) -> ScreenAction {
        match key.code {
            KeyCode::Esc => ScreenAction::Navigate(Route::Login),
            KeyCode::Tab | KeyCode::Down => {
                self.field = (self.field + 1) % self.fields.len();
                ScreenAction::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.field = (self.field + self.fields.len() - 1) % self.fields.len();
                ScreenAction::None
            }
            KeyCode::Enter => self.submit(),
            _ => {
                self.fields[self.field].handle_key(key);
                ScreenAction::None
            }
        }
    }

    fn enter(&mut self, _ctx: &ViewContext<'_>) {
        self.error = None;
    }

    fn notify(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Done | Outcome::Notice(_) => {
                self.fields.iter_mut().for_each(TextInput::clear);
                self.field = 0;
                self.error = None;
            }
            Outcome::Failed(msg) => self.error = Some(msg),
        }
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("Tab", "Next field"), ("Enter", "Create account"), ("Esc", "Back to sign in")]
    }
}
