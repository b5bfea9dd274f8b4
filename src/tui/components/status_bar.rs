use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::chat::TurnPhase;
use crate::tui::{components::Component, Event, Theme};

pub struct StatusBar {
    status_message: String,
    session_label: String,
    endpoint: String,
    phase: TurnPhase,
}

impl StatusBar {
    pub fn new(endpoint: String) -> Self {
        Self {
            status_message: "Ready".to_string(),
            session_label: String::new(),
            endpoint,
            phase: TurnPhase::Idle,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    pub fn status(&self) -> &str {
        &self.status_message
    }

    /// Show the first block of the session uuid
    pub fn set_session(&mut self, session_id: &str) {
        let short = session_id.split('-').next().unwrap_or(session_id);
        self.session_label = format!("session {}", short);
    }

    pub fn set_phase(&mut self, phase: TurnPhase) {
        self.phase = phase;
    }

    fn phase_indicator(&self, theme: &Theme) -> (&'static str, &'static str, Style) {
        match self.phase {
            TurnPhase::Idle => ("○", "Idle", theme.secondary()),
            TurnPhase::Sending => ("◐", "Sending...", theme.warning()),
            TurnPhase::Succeeded => ("●", "Replied", theme.success()),
            TurnPhase::Failed => ("●", "Failed", theme.error()),
        }
    }
}

impl Component for StatusBar {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let (symbol, label, style) = self.phase_indicator(theme);

        let status_line = Line::from(vec![
            Span::styled(symbol, style),
            Span::raw(" "),
            Span::styled(label, style),
            Span::raw(" | "),
            Span::styled(&self.status_message, theme.normal()),
            Span::raw(" | "),
            Span::styled(&self.session_label, theme.accent()),
            Span::raw(" | "),
            Span::styled(&self.endpoint, theme.secondary()),
            Span::raw(" | "),
            Span::styled("F1: Help", theme.secondary()),
            Span::raw(" | "),
            Span::styled("Ctrl+Q: Quit", theme.secondary()),
        ]);

        let paragraph = Paragraph::new(status_line)
            .block(Block::default().borders(Borders::TOP).border_style(theme.border()))
            .alignment(Alignment::Left);

        frame.render_widget(paragraph, area);
    }

    fn handle_event(&mut self, _event: &Event) -> bool {
        false
    }

    fn title(&self) -> &str {
        "StatusBar"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_label_uses_uuid_prefix() {
        let mut bar = StatusBar::new("http://localhost:5678/webhook/test-chat".to_string());
        bar.set_session("3f2a9c1e-0000-4000-8000-000000000000");
        assert_eq!(bar.session_label, "session 3f2a9c1e");
    }

    #[test]
    fn test_phase_indicator() {
        let theme = Theme::dark();
        let mut bar = StatusBar::new(String::new());
        assert_eq!(bar.phase_indicator(&theme).1, "Idle");

        bar.set_phase(TurnPhase::Failed);
        let (_, label, style) = bar.phase_indicator(&theme);
        assert_eq!(label, "Failed");
        assert_eq!(style.fg, Some(theme.error));
    }
}
