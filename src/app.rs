//! Main application state and event loop.

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::screens::{
    guard, ChatScreen, DashboardScreen, LoginScreen, Outcome, Route, Screen, ScreenAction,
    SignupScreen, ViewContext,
};
use crate::services::{copy_to_clipboard, ChatStore, SessionStore, Theme};

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Stores and settings the screens read from.
struct State {
    config: Config,
    theme: Theme,
    session: SessionStore,
    chats: ChatStore,
}

impl State {
    fn view(&self) -> ViewContext<'_> {
        ViewContext {
            session: &self.session,
            chats: &self.chats,
            theme: &self.theme,
            config: &self.config,
        }
    }

    /// Reload the conversation list for whoever is signed in now.
    fn sync_chats(&mut self) -> crate::error::Result<()> {
        self.chats.restore(self.session.current())
    }
}

struct Screens {
    login: LoginScreen,
    signup: SignupScreen,
    dashboard: DashboardScreen,
    chat: ChatScreen,
}

impl Screens {
    fn get(&mut self, route: &Route) -> &mut dyn Screen {
        match route {
            Route::Login => &mut self.login,
            Route::Signup => &mut self.signup,
            Route::Dashboard => &mut self.dashboard,
            Route::Chat(_) => &mut self.chat,
        }
    }
}

/// Application state.
pub struct App {
    state: State,
    screens: Screens,
    route: Route,
    should_quit: bool,

    // Status bar info
    status_message: String,
    /// Set while a request is in flight
    busy: Option<&'static str>,
}

impl App {
    /// Create a new application instance over restored stores.
    pub fn new(config: Config, session: SessionStore, chats: ChatStore, status: String) -> Self {
        let theme = Theme::from_config(&config.theme);
        let mut app = Self {
            state: State {
                config,
                theme,
                session,
                chats,
            },
            screens: Screens {
                login: LoginScreen::new(),
                signup: SignupScreen::new(),
                dashboard: DashboardScreen::new(),
                chat: ChatScreen::new(),
            },
            route: Route::Dashboard,
            should_quit: false,
            status_message: status,
            busy: None,
        };
        app.navigate(Route::Dashboard);
        app
    }

    /// Run the application.
    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    /// Main event loop.
    async fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match (key.modifiers, key.code) {
                        (KeyModifiers::CONTROL, KeyCode::Char('c'))
                        | (KeyModifiers::CONTROL, KeyCode::Char('q')) => {
                            self.should_quit = true;
                        }
                        _ => {
                            let action = self
                                .screens
                                .get(&self.route)
                                .handle_key(key, &self.state.view())
                                .await;
                            self.dispatch(action, terminal).await?;
                        }
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    async fn dispatch(&mut self, action: ScreenAction, terminal: &mut Tui) -> Result<()> {
        match action {
            ScreenAction::None => {}
            ScreenAction::Status(msg) => self.status_message = msg,
            ScreenAction::Navigate(route) => self.navigate(route),
            ScreenAction::CopyAnswer => self.copy_answer(),
            ScreenAction::Logout => self.logout(),
            ScreenAction::Quit => self.should_quit = true,
            request => {
                // One request at a time. Keys typed while waiting are dropped.
                self.busy = Some(busy_label(&request));
                terminal.draw(|f| self.draw(f))?;
                self.execute(request).await;
                self.busy = None;
                discard_pending_input()?;
            }
        }
        Ok(())
    }

    /// Run a request-backed action and report the outcome.
    async fn execute(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::Login { email, password } => {
                let result = self
                    .state
                    .session
                    .login(&email, &password)
                    .await
                    .map(|user| user.display_name().to_string());
                match result {
                    Ok(name) => {
                        self.screens.login.notify(Outcome::Done);
                        self.status_message = format!("Signed in as {}", name);
                        self.reload_chats();
                        self.navigate(Route::Dashboard);
                    }
                    Err(e) => self.screens.login.notify(Outcome::Failed(e.to_string())),
                }
            }
            ScreenAction::Signup {
                name,
                email,
                password,
            } => match self.state.session.signup(&name, &email, &password).await {
                Ok(ack) => {
                    self.screens.signup.notify(Outcome::Done);
                    self.screens.login.notify(Outcome::Notice(ack));
                    self.navigate(Route::Login);
                }
                Err(e) => self.screens.signup.notify(Outcome::Failed(e.to_string())),
            },
            ScreenAction::Upload(path) => {
                let result = self
                    .state
                    .chats
                    .upload(&path)
                    .await
                    .map(|c| (c.id.clone(), c.document_name().to_string()));
                match result {
                    Ok((id, name)) => {
                        self.screens.chat.notify(Outcome::Done);
                        self.status_message = format!("Uploaded {}", name);
                        self.navigate(Route::Chat(Some(id)));
                    }
                    Err(e) => {
                        self.status_message = e.to_string();
                        self.screens.chat.notify(Outcome::Failed(e.to_string()));
                    }
                }
            }
            ScreenAction::Send(text) => {
                let result = self
                    .state
                    .chats
                    .send_message(&text)
                    .await
                    .map(|reply| reply.is_some());
                match result {
                    Ok(true) => self.screens.chat.notify(Outcome::Done),
                    Ok(false) => self.status_message = "Open a chat before asking".to_string(),
                    Err(e) => {
                        self.status_message = e.to_string();
                        self.screens.chat.notify(Outcome::Failed(e.to_string()));
                    }
                }
            }
            ScreenAction::Delete(id) => {
                match self.state.chats.delete_conversation(&id).await {
                    Ok(()) => self.status_message = "Chat deleted".to_string(),
                    Err(e) => self.status_message = e.to_string(),
                }
                // Leaves a chat that no longer exists
                self.navigate(self.route.clone());
            }
            other => debug!("Ignoring {:?} in execute", other),
        }
    }

    fn reload_chats(&mut self) {
        if let Err(e) = self.state.sync_chats() {
            warn!("Could not load conversations: {}", e);
            self.status_message = e.to_string();
        }
    }

    fn logout(&mut self) {
        let result = self.state.session.logout();
        self.reload_chats();
        self.status_message = match result {
            Ok(()) => "Signed out".to_string(),
            Err(e) => {
                warn!("Sign-out did not clear local data: {}", e);
                format!("Signed out, but local data was not cleared: {}", e)
            }
        };
        self.navigate(Route::Login);
    }

    fn copy_answer(&mut self) {
        let answer = self.state.chats.focused().and_then(|c| c.last_answer());
        self.status_message = match answer {
            None => "No answer to copy yet".to_string(),
            Some(text) => match copy_to_clipboard(text) {
                Ok(()) => "Answer copied to clipboard".to_string(),
                Err(e) => format!("{:#}", e),
            },
        };
    }

    /// Switch routes through the guard and sync focus with the chat route.
    fn navigate(&mut self, requested: Route) {
        let chats = &self.state.chats;
        let route = guard(
            requested.clone(),
            self.state.session.is_signed_in(),
            |id| chats.get_conversation(id).is_some(),
        );
        if route != requested {
            debug!("Redirected {:?} to {:?}", requested, route);
        }

        match &route {
            Route::Chat(Some(id)) => {
                self.state.chats.focus(id);
            }
            Route::Chat(None) => self.state.chats.clear_focus(),
            _ => {}
        }

        if route != self.route {
            info!("Route {:?}", route);
        }
        self.route = route;
        self.screens.get(&self.route).enter(&self.state.view());
    }

    /// Draw the UI.
    fn draw(&mut self, f: &mut ratatui::Frame) {
        use ratatui::layout::{Constraint, Direction, Layout};
        use ratatui::style::{Modifier, Style};
        use ratatui::text::{Line, Span};
        use ratatui::widgets::{Block, Borders, Paragraph, Tabs};

        let theme = &self.state.theme;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tab bar
                Constraint::Min(0),    // Main content
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        // Tab bar
        let (titles, selected) = match &self.route {
            Route::Login => (["Sign in", "Sign up"], 0),
            Route::Signup => (["Sign in", "Sign up"], 1),
            Route::Dashboard => (["Dashboard", "Chat"], 0),
            Route::Chat(_) => (["Dashboard", "Chat"], 1),
        };
        let heading = match self.state.session.current() {
            Some(user) => format!("docchat - {}", user.display_name()),
            None => "docchat".to_string(),
        };
        let tabs = Tabs::new(titles.iter().map(|t| Line::from(*t)))
            .block(Block::default().borders(Borders::ALL).title(heading))
            .select(selected)
            .style(Style::default().fg(theme.text))
            .highlight_style(
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(tabs, chunks[0]);

        // Main content area
        let ctx = self.state.view();
        let screen = self.screens.get(&self.route);
        screen.draw(f, chunks[1], &ctx);

        // Status bar
        let mut spans = vec![Span::raw(" ")];
        match self.busy {
            Some(label) => spans.push(Span::styled(
                format!("{}...", label),
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            )),
            None => spans.push(Span::styled(
                self.status_message.as_str(),
                Style::default().fg(theme.answer),
            )),
        }
        for (key, label) in screen.hints() {
            spans.push(Span::raw(" │ "));
            spans.push(Span::styled(*key, Style::default().fg(theme.muted)));
            spans.push(Span::styled(format!(" {}", label), Style::default().fg(theme.answer)));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), chunks[2]);
    }
}

fn busy_label(action: &ScreenAction) -> &'static str {
    match action {
        ScreenAction::Login { .. } => "Signing in",
        ScreenAction::Signup { .. } => "Creating account",
        ScreenAction::Upload(_) => "Uploading and summarizing document",
        ScreenAction::Send(_) => "Waiting for an answer",
        ScreenAction::Delete(_) => "Deleting chat",
        _ => "Working",
    }
}

/// Drop key presses queued while a request was in flight.
fn discard_pending_input() -> io::Result<()> {
    while event::poll(Duration::ZERO)? {
        let _ = event::read()?;
    }
    Ok(())
}
