use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem},
    Frame,
};

use crate::tui::{components::Component, Event, Theme};

pub struct HelpPopup {
    is_visible: bool,
}

impl HelpPopup {
    pub fn new() -> Self {
        Self { is_visible: false }
    }

    pub fn hide(&mut self) {
        self.is_visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub fn toggle(&mut self) {
        self.is_visible = !self.is_visible;
    }

    fn help_content() -> &'static [(&'static str, &'static str)] {
        &[
            ("Tabs", ""),
            ("  Tab / F2", "Switch between Chat and Logs"),
            ("  Alt+1 / Alt+2", "Go to Chat / Logs"),
            ("", ""),
            ("Chat", ""),
            ("  Enter", "Send message"),
            ("  Shift+Enter", "Multiline message"),
            ("  Esc (multiline)", "Back to single line"),
            ("  Up/Down, PgUp/PgDn", "Scroll conversation"),
            ("  Ctrl+N", "Start a new session"),
            ("", ""),
            ("Logs", ""),
            ("  Up/Down (j/k)", "Scroll"),
            ("  Home/End (g/G)", "Top / follow latest"),
            ("  d", "Show/hide details"),
            ("", ""),
            ("General", ""),
            ("  F1", "Show/hide this help"),
            ("  Ctrl+C / Ctrl+Q", "Quit"),
        ]
    }

    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

impl Default for HelpPopup {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for HelpPopup {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if !self.is_visible {
            return;
        }

        let popup_area = Self::centered_rect(60, 70, area);
        frame.render_widget(Clear, popup_area);

        let items: Vec<ListItem> = Self::help_content()
            .iter()
            .map(|(key, description)| {
                if key.is_empty() {
                    ListItem::new(Line::from(""))
                } else if description.is_empty() {
                    ListItem::new(Line::from(Span::styled(
                        *key,
                        theme.accent().add_modifier(Modifier::BOLD),
                    )))
                } else {
                    ListItem::new(Line::from(vec![
                        Span::styled(*key, theme.highlight()),
                        Span::raw(": "),
                        Span::styled(*description, theme.normal()),
                    ]))
                }
            })
            .collect();

        let help_list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.accent())
                    .title(" Help - Press F1 or Esc to close "),
            )
            .style(theme.normal());

        frame.render_widget(help_list, popup_area);
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if !self.is_visible {
            return false;
        }

        match event {
            Event::Key(key) => match (key.code, key.modifiers) {
                (KeyCode::Char('c'), KeyModifiers::CONTROL)
                | (KeyCode::Char('q'), KeyModifiers::CONTROL) => false,
                (KeyCode::Esc, _) | (KeyCode::F(1), _) | (KeyCode::Char('q'), _) => {
                    self.hide();
                    true
                }
                // Modal: swallow everything else
                _ => true,
            },
            _ => false,
        }
    }

    fn title(&self) -> &str {
        "HelpPopup"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    #[test]
    fn test_popup_is_modal_until_closed() {
        let mut popup = HelpPopup::new();
        let key_a = Event::Key(KeyEvent::from(KeyCode::Char('a')));
        assert!(!popup.handle_event(&key_a));

        popup.toggle();
        assert!(popup.handle_event(&key_a));
        assert!(popup.is_visible());

        assert!(popup.handle_event(&Event::Key(KeyEvent::from(KeyCode::Esc))));
        assert!(!popup.is_visible());
    }

    #[test]
    fn test_quit_passes_through() {
        let mut popup = HelpPopup::new();
        popup.toggle();
        let ctrl_q = Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert!(!popup.handle_event(&ctrl_q));
    }
}
