use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::logs::LogEntry;
use crate::tui::{components::Component, markdown::wrap_line, Event, Theme};

const PAGE_SCROLL: usize = 10;

/// Live view of the log broadcaster's snapshot
pub struct LogView {
    entries: Vec<LogEntry>,
    show_details: bool,
    follow: bool,
    scroll_offset: usize,
}

impl LogView {
    pub fn new(show_details: bool) -> Self {
        Self {
            entries: Vec::new(),
            show_details,
            follow: true,
            scroll_offset: 0,
        }
    }

    pub fn set_entries(&mut self, entries: Vec<LogEntry>) {
        self.entries = entries;
        if self.follow {
            self.scroll_offset = usize::MAX;
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn toggle_details(&mut self) {
        self.show_details = !self.show_details;
    }

    pub fn shows_details(&self) -> bool {
        self.show_details
    }

    fn entry_lines(&self, entry: &LogEntry, width: usize, theme: &Theme) -> Vec<Line<'static>> {
        let style = theme.level(entry.level);
        let header = Line::from(vec![
            Span::styled(entry.level.icon(), style),
            Span::raw(" "),
            Span::styled(entry.time_label(), theme.secondary()),
            Span::raw(" "),
            Span::styled(format!("{:<5}", entry.level.as_str().to_uppercase()), style),
            Span::raw(" "),
            Span::styled(entry.message.clone(), theme.normal()),
        ]);

        let mut lines = wrap_line(&header, width);

        if self.show_details {
            if let Some(details) = &entry.details {
                let pretty = serde_json::to_string_pretty(details).unwrap_or_else(|_| details.to_string());
                for detail in pretty.lines() {
                    let line = Line::from(vec![
                        Span::styled("    ", theme.secondary()),
                        Span::styled(detail.to_string(), theme.code()),
                    ]);
                    lines.extend(wrap_line(&line, width));
                }
            }
        }

        lines
    }

    fn build_lines(&self, width: usize, theme: &Theme) -> Vec<Line<'static>> {
        self.entries
            .iter()
            .flat_map(|entry| self.entry_lines(entry, width, theme))
            .collect()
    }
}

impl Component for LogView {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let title = format!(
            " Logs ({}) {} ",
            self.entries.len(),
            if self.show_details { "· details" } else { "" }
        );
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border())
            .title(title);

        if self.entries.is_empty() {
            let empty = Paragraph::new("No log entries yet")
                .block(block)
                .alignment(Alignment::Center)
                .style(theme.secondary());
            frame.render_widget(empty, area);
            return;
        }

        let content_width = area.width.saturating_sub(2) as usize;
        let content_height = area.height.saturating_sub(2) as usize;

        let all_lines = self.build_lines(content_width, theme);
        let max_scroll = all_lines.len().saturating_sub(content_height);
        if self.follow || self.scroll_offset >= max_scroll {
            self.scroll_offset = max_scroll;
            self.follow = true;
        }

        let visible: Vec<Line> = all_lines
            .into_iter()
            .skip(self.scroll_offset)
            .take(content_height)
            .collect();

        frame.render_widget(Paragraph::new(visible).block(block), area);
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        let Event::Key(KeyEvent { code, .. }) = event else {
            return false;
        };

        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
                self.follow = false;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
                self.follow = false;
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(PAGE_SCROLL);
                self.follow = false;
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_add(PAGE_SCROLL);
                self.follow = false;
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.scroll_offset = 0;
                self.follow = false;
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.scroll_offset = usize::MAX;
                self.follow = true;
            }
            KeyCode::Char('d') => self.toggle_details(),
            _ => return false,
        }
        true
    }

    fn title(&self) -> &str {
        "LogView"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::LogBroadcaster;
    use serde_json::json;

    fn texts(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn sample_entries() -> Vec<LogEntry> {
        let logs = LogBroadcaster::new(10);
        logs.info("Sending message to workflow", Some(json!({"preview": "hi"})));
        logs.error("Workflow request failed", None);
        logs.entries()
    }

    #[test]
    fn test_lines_with_details() {
        let mut view = LogView::new(true);
        view.set_entries(sample_entries());

        let lines = texts(&view.build_lines(120, &Theme::dark()));

        assert!(lines[0].starts_with("ℹ️ "));
        assert!(lines[0].ends_with("INFO  Sending message to workflow"));
        assert_eq!(lines[1], "    {");
        assert_eq!(lines[2], "      \"preview\": \"hi\"");
        assert_eq!(lines[3], "    }");
        assert!(lines[4].ends_with("ERROR Workflow request failed"));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_details_toggle() {
        let mut view = LogView::new(true);
        view.set_entries(sample_entries());

        let handled = view.handle_event(&Event::Key(KeyEvent::from(KeyCode::Char('d'))));
        assert!(handled);
        assert!(!view.shows_details());
        assert_eq!(view.build_lines(120, &Theme::dark()).len(), 2);
        assert_eq!(view.entry_count(), 2);
    }

    #[test]
    fn test_manual_scroll_stops_following() {
        let mut view = LogView::new(false);
        view.set_entries(sample_entries());
        assert!(view.follow);

        view.handle_event(&Event::Key(KeyEvent::from(KeyCode::Up)));
        assert!(!view.follow);

        view.handle_event(&Event::Key(KeyEvent::from(KeyCode::End)));
        assert!(view.follow);
    }
}
