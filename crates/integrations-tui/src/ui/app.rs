use super::{
    data_panel::{render_data_panel, DataPanelProps},
    footer::render_footer,
    header::render_header,
    selector::{render_selector, SelectorProps},
};
use chrono::{DateTime, Local};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use integrations_core::{
    client::{ClientError, IntegrationClient},
    integration::{IntegrationRegistry, SetupContext, SetupError, SetupKind, SetupStep},
    loader::{LoadOutcome, LoadTicket, LoaderPanel, Notification},
    settings::Settings,
    store::{IntegrationStore, CREDENTIALS_KEY, TYPE_KEY},
    theme::{Element, Theme},
};
use anyhow::Result;
use ratatui::{
    prelude::{Constraint, CrosstermBackend, Direction, Layout, Terminal},
    widgets::{Block, Borders},
};
use serde_json::{Map, Value};
use std::io::Stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use strum::{EnumIter, IntoEnumIterator};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter)]
pub enum Focus {
    #[default]
    User,
    Org,
    IntegrationType,
    Setup,
    LoadData,
    ClearData,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SetupState {
    #[default]
    Idle,
    InProgress,
    AwaitingAuthorization(String),
    Connected,
}

/// Results delivered from spawned requests back to the UI loop.
#[derive(Debug)]
pub enum AppMessage {
    LoadFinished(LoadTicket, Result<Value, ClientError>),
    SetupFinished {
        integration: String,
        epoch: u64,
        result: Result<SetupStep, SetupError>,
    },
}

pub struct App {
    should_quit: bool,
    theme: Theme,
    mode: AppMode,
    focus: Focus,
    edit_buffer: String,
    settings: Settings,
    settings_path: PathBuf,
    store: IntegrationStore,
    registry: IntegrationRegistry,
    client: IntegrationClient,
    loader: LoaderPanel,
    setup: SetupState,
    setup_input: String,
    setup_notice: Option<Notification>,
    loaded_at: Option<DateTime<Local>>,
    data_scroll: u16,
    tick: u64,
    tx: UnboundedSender<AppMessage>,
    rx: UnboundedReceiver<AppMessage>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            should_quit: false,
            theme: Theme::new(settings.theme),
            mode: AppMode::Normal,
            focus: Focus::default(),
            edit_buffer: String::new(),
            store: IntegrationStore::new(&settings.default_user, &settings.default_org),
            registry: IntegrationRegistry::with_configured(&settings.integrations),
            client: IntegrationClient::new(&settings.base_url, settings.request_timeout()),
            loader: LoaderPanel::new(settings.notification_ttl(), settings.discard_stale_responses),
            setup: SetupState::default(),
            setup_input: String::new(),
            setup_notice: None,
            loaded_at: None,
            data_scroll: 0,
            tick: 0,
            settings,
            settings_path: Settings::config_path(),
            tx,
            rx,
        }
    }

    pub async fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        while !self.should_quit {
            self.draw(terminal)?;
            self.handle_events()?;
            while let Ok(message) = self.rx.try_recv() {
                self.handle_message(message);
            }
            self.expire_notifications(Instant::now());
            self.tick = self.tick.wrapping_add(1);
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    fn draw(&self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        terminal.draw(|frame| {
            let area = frame.size();
            frame.render_widget(
                Block::new()
                    .borders(Borders::NONE)
                    .style(self.theme.ratatui_style(Element::Background)),
                area,
            );

            let selector_height = if self.store.has_selection() { 12 } else { 6 };
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Length(selector_height),
                    Constraint::Min(0),
                    Constraint::Length(3),
                ])
                .split(area);

            render_header(frame, chunks[0], &self.theme, &self.store, self.client.base_url());
            render_selector(
                frame,
                chunks[1],
                SelectorProps {
                    theme: &self.theme,
                    store: &self.store,
                    setup_kind: self.current_setup_kind(),
                    setup: &self.setup,
                    setup_input: &self.setup_input,
                    focus: self.focus,
                    mode: self.mode,
                    edit_buffer: &self.edit_buffer,
                },
            );

            if self.store.has_credentials() {
                render_data_panel(
                    frame,
                    chunks[2],
                    DataPanelProps {
                        theme: &self.theme,
                        loading: self.loader.is_loading(),
                        data: self.store.loaded_data(),
                        loaded_at: self.loaded_at,
                        focus: self.focus,
                        scroll: self.data_scroll,
                        tick: self.tick,
                    },
                );
            }

            let notice = self
                .loader
                .notification()
                .or(self.setup_notice.as_ref())
                .map(Notification::message);
            render_footer(frame, chunks[3], &self.theme, self.mode, notice);
        })?;
        Ok(())
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.mode {
            AppMode::Editing => match key.code {
                KeyCode::Enter => self.commit_edit(),
                KeyCode::Esc => {
                    self.edit_buffer.clear();
                    self.mode = AppMode::Normal;
                }
                KeyCode::Backspace => {
                    self.edit_buffer.pop();
                }
                KeyCode::Char(c) => self.edit_buffer.push(c),
                _ => {}
            },
            AppMode::Normal => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Esc => {
                    if self.loader.notification().is_some() || self.setup_notice.is_some() {
                        self.dismiss_notifications();
                    } else {
                        self.should_quit = true;
                    }
                }
                KeyCode::Char('t') => {
                    self.theme.toggle();
                    self.settings.theme = self.theme.variant();
                    if let Err(e) = self.settings.save_to(&self.settings_path) {
                        tracing::warn!(error = %e, path = %self.settings_path.display(), "could not save theme");
                    }
                }
                KeyCode::Char('d') => self.dismiss_notifications(),
                KeyCode::Char('l') => self.load_data(),
                KeyCode::Char('c') => self.clear_data(),
                KeyCode::Tab | KeyCode::Down => self.focus = self.next_focus(self.focus, 1),
                KeyCode::BackTab | KeyCode::Up => self.focus = self.next_focus(self.focus, -1),
                KeyCode::PageDown => self.data_scroll = self.data_scroll.saturating_add(5),
                KeyCode::PageUp => self.data_scroll = self.data_scroll.saturating_sub(5),
                KeyCode::Left if self.focus == Focus::IntegrationType => {
                    let previous = self.registry.previous_name(self.store.current_type());
                    self.select_type(previous);
                }
                KeyCode::Right if self.focus == Focus::IntegrationType => {
                    let next = self.registry.next_name(self.store.current_type());
                    self.select_type(next);
                }
                KeyCode::Enter => self.activate(),
                _ => {}
            },
        }
    }

    fn activate(&mut self) {
        match self.focus {
            Focus::User => self.start_edit(self.store.user().to_string()),
            Focus::Org => self.start_edit(self.store.org().to_string()),
            Focus::IntegrationType => {
                let next = self.registry.next_name(self.store.current_type());
                self.select_type(next);
            }
            Focus::Setup => {
                if self.current_setup_kind() == Some(SetupKind::Token)
                    && !matches!(self.setup, SetupState::InProgress)
                {
                    self.start_edit(self.setup_input.clone());
                } else {
                    self.start_setup();
                }
            }
            Focus::LoadData => self.load_data(),
            Focus::ClearData => self.clear_data(),
        }
    }

    fn start_edit(&mut self, current: String) {
        self.edit_buffer = current;
        self.mode = AppMode::Editing;
    }

    fn commit_edit(&mut self) {
        let value = std::mem::take(&mut self.edit_buffer);
        self.mode = AppMode::Normal;
        match self.focus {
            Focus::User => self.store.set_user(value),
            Focus::Org => self.store.set_org(value),
            Focus::Setup => {
                self.setup_input = value;
                self.start_setup();
            }
            _ => {}
        }
    }

    /// Focus targets that are currently on screen.
    fn is_focusable(&self, focus: Focus) -> bool {
        match focus {
            Focus::User | Focus::Org | Focus::IntegrationType => true,
            Focus::Setup => self.store.has_selection(),
            Focus::LoadData | Focus::ClearData => self.store.has_credentials(),
        }
    }

    fn next_focus(&self, from: Focus, step: isize) -> Focus {
        let order: Vec<Focus> = Focus::iter().filter(|f| self.is_focusable(*f)).collect();
        let current = order.iter().position(|f| *f == from).unwrap_or(0) as isize;
        let len = order.len() as isize;
        order[(current + step).rem_euclid(len) as usize]
    }

    fn select_type(&mut self, next: Option<String>) {
        self.store.set_current_type(next);
        self.setup = SetupState::Idle;
        self.setup_input.clear();
        self.setup_notice = None;
        self.loaded_at = None;
        self.data_scroll = 0;
        if !self.is_focusable(self.focus) {
            self.focus = Focus::IntegrationType;
        }
    }

    fn current_setup_kind(&self) -> Option<SetupKind> {
        self.store
            .current_type()
            .and_then(|name| self.registry.get(name))
            .map(|entry| entry.setup.kind())
    }

    fn start_setup(&mut self) {
        if matches!(self.setup, SetupState::InProgress) {
            return;
        }
        let Some(integration) = self.store.current_type().map(str::to_string) else {
            return;
        };
        let Some(entry) = self.registry.get(&integration).cloned() else {
            return;
        };

        let ctx = SetupContext {
            user: self.store.user().to_string(),
            org: self.store.org().to_string(),
            endpoint_id: entry.endpoint_id.clone(),
            params: self.store.integration_params().clone(),
            input: self.setup_input.clone(),
        };
        let finishing = matches!(self.setup, SetupState::AwaitingAuthorization(_));
        let epoch = self.store.selection_epoch();
        let client = self.client.clone();
        let tx = self.tx.clone();

        self.setup = SetupState::InProgress;
        self.setup_notice = None;

        tokio::spawn(async move {
            let result = if finishing {
                entry
                    .setup
                    .finish(&client, &ctx)
                    .await
                    .map(SetupStep::Credentials)
            } else {
                entry.setup.begin(&client, &ctx).await
            };
            // The receiver only goes away when the app is shutting down.
            let _ = tx.send(AppMessage::SetupFinished {
                integration,
                epoch,
                result,
            });
        });
    }

    fn load_data(&mut self) {
        let Some(ticket) = self.loader.begin_load(&self.store, &self.registry) else {
            return;
        };
        self.data_scroll = 0;

        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.load(&ticket.endpoint_id, &ticket.credentials).await;
            // The receiver only goes away when the app is shutting down.
            let _ = tx.send(AppMessage::LoadFinished(ticket, result));
        });
    }

    fn clear_data(&mut self) {
        if self.loader.clear(&mut self.store) {
            self.loaded_at = None;
            self.data_scroll = 0;
        }
    }

    pub fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::LoadFinished(ticket, result) => {
                let outcome = self
                    .loader
                    .finish_load(&mut self.store, ticket, result, Instant::now());
                if outcome == LoadOutcome::Applied {
                    self.loaded_at = Some(Local::now());
                }
            }
            AppMessage::SetupFinished {
                integration,
                epoch,
                result,
            } => {
                if epoch != self.store.selection_epoch() {
                    tracing::debug!(%integration, "ignoring setup result for a previous selection");
                    return;
                }
                match result {
                    Ok(SetupStep::OpenUrl(url)) => {
                        self.setup = SetupState::AwaitingAuthorization(url);
                    }
                    Ok(SetupStep::Credentials(credentials)) => {
                        let mut params = Map::new();
                        params.insert(CREDENTIALS_KEY.to_string(), credentials);
                        params.insert(TYPE_KEY.to_string(), Value::String(integration));
                        self.store.set_integration_params(params);
                        self.setup = SetupState::Connected;
                        self.loaded_at = None;
                    }
                    Err(err) => {
                        tracing::warn!(%integration, error = %err, "integration setup failed");
                        self.setup = SetupState::Idle;
                        self.setup_notice = Some(Notification::new(
                            err.user_message(),
                            Instant::now(),
                            self.settings.notification_ttl(),
                        ));
                    }
                }
            }
        }
    }

    fn dismiss_notifications(&mut self) {
        self.loader.dismiss();
        self.setup_notice = None;
    }

    fn expire_notifications(&mut self, now: Instant) {
        self.loader.expire(now);
        if self.setup_notice.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.setup_notice = None;
        }
    }
}
