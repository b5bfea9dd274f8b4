use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    text::Line,
    widgets::Tabs,
    Frame,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::app::AppState;
use crate::chat::{FailureKind, TurnOutcome};
use crate::logs::Subscription;
use crate::tui::{
    components::{ChatView, Component, HelpPopup, InputBox, LogView, StatusBar},
    Event, Theme,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveTab {
    Chat,
    Logs,
}

impl ActiveTab {
    fn index(self) -> usize {
        match self {
            ActiveTab::Chat => 0,
            ActiveTab::Logs => 1,
        }
    }

    fn toggled(self) -> Self {
        match self {
            ActiveTab::Chat => ActiveTab::Logs,
            ActiveTab::Logs => ActiveTab::Chat,
        }
    }
}

pub struct App {
    chat_view: ChatView,
    log_view: LogView,
    input_box: InputBox,
    status_bar: StatusBar,
    help_popup: HelpPopup,

    active_tab: ActiveTab,
    theme: Theme,
    should_quit: bool,
    // set between spawning a send and hearing back from it
    pending_send: bool,

    app_state: Arc<AppState>,
    event_sender: mpsc::UnboundedSender<Event>,
    log_subscription: Subscription,
}

impl App {
    pub fn new(app_state: Arc<AppState>, event_sender: mpsc::UnboundedSender<Event>) -> Self {
        let ui = &app_state.config().ui;
        let theme = Theme::from_name(&ui.theme);
        let log_view = LogView::new(ui.show_log_details);

        // The callback runs on whichever task logged, so it only forwards
        let sender = event_sender.clone();
        let log_subscription = app_state.logs().subscribe(move |entries| {
            let _ = sender.send(Event::LogsUpdated(entries.to_vec()));
        });

        let mut app = Self {
            chat_view: ChatView::new(),
            log_view,
            input_box: InputBox::new(),
            status_bar: StatusBar::new(app_state.endpoint_description()),
            help_popup: HelpPopup::new(),
            active_tab: ActiveTab::Chat,
            theme,
            should_quit: false,
            pending_send: false,
            app_state,
            event_sender,
            log_subscription,
        };

        app.bind_session();
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn active_tab(&self) -> ActiveTab {
        self.active_tab
    }

    pub fn status(&self) -> &str {
        self.status_bar.status()
    }

    /// Stop receiving log snapshots; called once the UI loop ends
    pub fn shutdown(&self) {
        self.log_subscription.unsubscribe();
    }

    pub fn handle_event(&mut self, event: Event) {
        // Help popup takes priority
        if self.help_popup.is_visible() && self.help_popup.handle_event(&event) {
            return;
        }

        match event {
            Event::Key(key) => {
                if self.handle_global_keys(key) {
                    return;
                }
                self.handle_tab_keys(key);
            }
            Event::Tick | Event::Resize(_, _) => self.refresh_chat(),
            Event::TurnFinished(outcome) => {
                self.pending_send = false;
                self.refresh_chat();
                self.status_bar.set_status(Self::describe_outcome(&outcome));
            }
            Event::TurnRejected(reason) => {
                self.pending_send = false;
                self.refresh_chat();
                self.status_bar.set_status(reason);
            }
            Event::LogsUpdated(entries) => self.log_view.set_entries(entries),
        }
    }

    fn handle_global_keys(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            (KeyCode::F(1), _) => self.help_popup.toggle(),
            (KeyCode::Tab, _) | (KeyCode::BackTab, _) | (KeyCode::F(2), _) => {
                self.set_active_tab(self.active_tab.toggled())
            }
            (KeyCode::Char('1'), KeyModifiers::ALT) => self.set_active_tab(ActiveTab::Chat),
            (KeyCode::Char('2'), KeyModifiers::ALT) => self.set_active_tab(ActiveTab::Logs),
            (KeyCode::Char('n'), KeyModifiers::CONTROL) => self.start_new_session(),
            _ => return false,
        }
        true
    }

    fn handle_tab_keys(&mut self, key: KeyEvent) {
        let event = Event::Key(key);
        match self.active_tab {
            ActiveTab::Chat => {
                if self.input_box.handle_event(&event) {
                    return;
                }
                if self.chat_view.handle_event(&event) {
                    debug!("{} handled {:?}", self.chat_view.title(), key.code);
                    return;
                }
                if key.code == KeyCode::Enter {
                    self.send_message();
                }
            }
            ActiveTab::Logs => {
                if self.log_view.handle_event(&event) {
                    debug!("{} handled {:?}", self.log_view.title(), key.code);
                }
            }
        }
    }

    fn set_active_tab(&mut self, tab: ActiveTab) {
        self.active_tab = tab;
        let status = match tab {
            ActiveTab::Chat => "Type your message (Enter to send)",
            ActiveTab::Logs => "Browsing logs (d: details, End: follow)",
        };
        self.status_bar.set_status(status);
    }

    fn send_message(&mut self) {
        if self.input_box.is_empty() {
            return;
        }

        let session = self.app_state.session();
        if self.pending_send || session.is_sending() {
            self.status_bar.set_status("Still waiting for the previous reply");
            return;
        }

        let content = self.input_box.get_content();
        self.input_box.clear();
        self.pending_send = true;
        self.refresh_chat();
        self.status_bar.set_status("Sending...");

        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            let event = match session.send(&content).await {
                Ok(outcome) => Event::TurnFinished(outcome),
                Err(e) => Event::TurnRejected(e.to_string()),
            };
            let _ = sender.send(event);
        });
    }

    fn start_new_session(&mut self) {
        let session = self.app_state.start_new_session();
        info!("User started session {}", session.id());
        self.bind_session();
        self.status_bar.set_status("Started a new session");
    }

    fn bind_session(&mut self) {
        let session = self.app_state.session();
        self.status_bar.set_session(session.id());
        self.chat_view.set_title(format!("Chat · {}", self.app_state.endpoint_description()));
        self.chat_view.clear_messages();
        self.refresh_chat();
    }

    /// Pull history and turn state from the current session
    fn refresh_chat(&mut self) {
        let session = self.app_state.session();
        let sending = self.pending_send || session.is_sending();

        self.chat_view.sync_messages(session.messages());
        self.chat_view.set_waiting(sending);
        self.input_box.set_enabled(!sending);
        self.status_bar.set_phase(session.phase());
    }

    fn describe_outcome(outcome: &TurnOutcome) -> String {
        match outcome {
            TurnOutcome::Replied(message) => {
                format!("Reply received ({} chars)", message.content.chars().count())
            }
            TurnOutcome::Failed { kind, .. } => match kind {
                FailureKind::Transport(error) => format!("Workflow request failed: {}", error),
                FailureKind::Extraction(error) => format!("Unreadable workflow response: {}", error),
            },
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Tabs
                Constraint::Min(1),    // Active tab
                Constraint::Length(2), // Status bar
            ])
            .split(frame.size());

        let titles = vec![
            Line::from(" Chat "),
            Line::from(format!(" Logs ({}) ", self.log_view.entry_count())),
        ];
        let tabs = Tabs::new(titles)
            .select(self.active_tab.index())
            .style(self.theme.secondary())
            .highlight_style(self.theme.selected())
            .divider("|");
        frame.render_widget(tabs, chunks[0]);

        match self.active_tab {
            ActiveTab::Chat => {
                let chat_chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Min(1),
                        Constraint::Length(self.input_box.desired_height()),
                    ])
                    .split(chunks[1]);

                self.chat_view.render(frame, chat_chunks[0], &self.theme);
                self.input_box.render(frame, chat_chunks[1], &self.theme);
            }
            ActiveTab::Logs => self.log_view.render(frame, chunks[1], &self.theme),
        }

        self.status_bar.render(frame, chunks[2], &self.theme);

        // Help popup last so it sits on top
        self.help_popup.render(frame, frame.size(), &self.theme);
    }
}
