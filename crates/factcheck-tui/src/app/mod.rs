use ratatui::Frame;
use tokio::sync::mpsc;

use factcheck_core::{Badge, Command, CoordinatorEvent, Notification, ViewModel};

use crate::action::Action;
use crate::theme::Theme;
use crate::tui_event::UiEvent;


/// How long a notification stays in the footer, in ticks.
const NOTIFICATION_TICKS: usize = 40;

/// Rows skipped by PageUp/PageDown.
const PAGE_SIZE: usize = 5;

/// Which part of the screen receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Typing into the claim field.
    Editing,
    /// Scrolling through results.
    Browsing,
    /// Quit requested while checks are still running.
    ConfirmQuit,
}

pub struct App {
    pub view: ViewModel,
    pub theme: Theme,
    pub badge: Badge,
    /// Current footer notification and the tick at which it expires.
    pub notification: Option<(Notification, usize)>,
    /// Set when the coordinator refused a command.
    pub command_error: Option<String>,
    pub input_mode: InputMode,
    mode_before_quit: InputMode,
    pub selected: usize,
    pub tick: usize,
    pub should_quit: bool,
    pub backend_name: String,
    pub cmd_tx: Option<mpsc::UnboundedSender<Command>>,
}

impl App {
    pub fn new(view: ViewModel, theme: Theme, badge: Badge, backend_name: &str) -> Self {
        Self {
            view,
            theme,
            badge,
            notification: None,
            command_error: None,
            input_mode: InputMode::Editing,
            mode_before_quit: InputMode::Editing,
            selected: 0,
            tick: 0,
            should_quit: false,
            backend_name: backend_name.to_string(),
            cmd_tx: None,
        }
    }

    /// Apply a user action. Returns `true` once the app should exit.
    pub fn update(&mut self, action: Action) -> bool {
        match action {
            Action::None | Action::Resize(..) => {}
            Action::Tick => {
                self.tick = self.tick.wrapping_add(1);
                if let Some((_, expires)) = &self.notification
                    && self.tick >= *expires
                {
                    self.notification = None;
                }
            }
            Action::Quit => {
                if self.view.is_pending() && self.input_mode != InputMode::ConfirmQuit {
                    self.mode_before_quit = self.input_mode;
                    self.input_mode = InputMode::ConfirmQuit;
                } else {
                    self.should_quit = true;
                }
            }
            Action::ConfirmQuit => self.should_quit = true,
            Action::CancelQuit => self.input_mode = self.mode_before_quit,
            Action::Submit => self.submit(),
            Action::Clear => {
                let command = self.view.on_clear_clicked();
                self.selected = 0;
                self.send(command);
            }
            Action::InputChar(c) => {
                if matches!(self.view.status(), factcheck_core::ViewStatus::Error(_)) {
                    self.view.clear_status();
                }
                self.view.query_mut().push(c);
            }
            Action::Backspace => {
                self.view.query_mut().pop();
            }
            Action::ClearInput => self.view.query_mut().clear(),
            Action::ToggleFocus => {
                self.input_mode = match self.input_mode {
                    InputMode::Editing => InputMode::Browsing,
                    InputMode::Browsing => InputMode::Editing,
                    InputMode::ConfirmQuit => InputMode::ConfirmQuit,
                };
            }
            Action::MoveUp => self.selected = self.selected.saturating_sub(1),
            Action::MoveDown => self.select(self.selected.saturating_add(1)),
            Action::PageUp => self.selected = self.selected.saturating_sub(PAGE_SIZE),
            Action::PageDown => self.select(self.selected.saturating_add(PAGE_SIZE)),
            Action::GoTop => self.selected = 0,
            Action::GoBottom => self.select(usize::MAX),
        }
        self.should_quit
    }

    /// Apply something the coordinator side sent.
    pub fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Coordinator(event) => {
                if event == CoordinatorEvent::ResultsCleared {
                    self.selected = 0;
                }
                self.view.apply(&event);
                self.select(self.selected);
            }
            UiEvent::Resync(state) => {
                self.view.reload(state);
                self.select(self.selected);
            }
            UiEvent::Badge(badge) => self.badge = badge,
            UiEvent::Notification(notification) => {
                self.notification = Some((notification, self.tick + NOTIFICATION_TICKS));
            }
            UiEvent::Ack(ack) => {
                self.command_error =
                    (!ack.success).then(|| "The coordinator could not accept that request".into());
            }
        }
    }

    pub fn view(&self, f: &mut Frame) {
        crate::view::render(f, self);
    }

    fn submit(&mut self) {
        let text = self.view.query().to_string();
        match self.view.on_submit_clicked(&text) {
            Ok(command) => {
                self.view.query_mut().clear();
                self.send(command);
            }
            Err(e) => tracing::debug!(error = %e, "submit rejected"),
        }
    }

    fn send(&mut self, command: Command) {
        let Some(tx) = &self.cmd_tx else {
            return;
        };
        if tx.send(command).is_err() {
            tracing::error!("coordinator command channel closed");
            self.command_error = Some("The coordinator has stopped".to_string());
        }
    }

    /// Move the selection, clamped to the result list.
    fn select(&mut self, index: usize) {
        let len = self.view.results().len();
        self.selected = if len == 0 { 0 } else { index.min(len - 1) };
    }
}
