use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::chat::{ChatMessage, MessageRole};
use crate::tui::{
    components::Component,
    markdown::{markdown_to_lines, wrap_line},
    Event, Theme,
};

const PAGE_SCROLL: usize = 10;

pub struct ChatView {
    messages: Vec<ChatMessage>,
    waiting: bool,
    auto_scroll: bool,
    title: String,
    scroll_offset: usize,
}

impl ChatView {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            waiting: false,
            auto_scroll: true,
            title: "Chat".to_string(),
            scroll_offset: 0,
        }
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
    }

    /// Replace the displayed history. Only jumps to the bottom when the
    /// history actually changed and the view was following it.
    pub fn sync_messages(&mut self, messages: Vec<ChatMessage>) {
        if messages.len() != self.messages.len() {
            self.messages = messages;
            if self.auto_scroll {
                self.scroll_to_bottom();
            }
        }
    }

    pub fn set_waiting(&mut self, waiting: bool) {
        if self.waiting != waiting {
            self.waiting = waiting;
            if self.auto_scroll {
                self.scroll_to_bottom();
            }
        }
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.waiting = false;
        self.scroll_to_bottom();
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
        self.auto_scroll = false;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
        // render clamps and re-enables following once the bottom is reached
        self.auto_scroll = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = usize::MAX;
        self.auto_scroll = true;
    }

    fn format_timestamp(message: &ChatMessage) -> String {
        message
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%H:%M")
            .to_string()
    }

    fn role_indicator(role: MessageRole, theme: &Theme) -> (&'static str, &'static str, Style) {
        match role {
            MessageRole::User => ("👤", "You", theme.accent()),
            MessageRole::Assistant => ("🤖", "Workflow", theme.success()),
        }
    }

    /// All display lines for the current history, wrapped to `width`
    fn build_lines(&self, width: usize, theme: &Theme) -> Vec<Line<'static>> {
        let body_width = width.saturating_sub(2);
        let mut all_lines: Vec<Line<'static>> = Vec::new();

        for message in &self.messages {
            let (icon, name, style) = Self::role_indicator(message.role, theme);
            all_lines.push(Line::from(vec![
                Span::styled(icon, style),
                Span::raw(" "),
                Span::styled(name, style),
                Span::raw(" "),
                Span::styled(Self::format_timestamp(message), theme.secondary()),
            ]));

            // User text is shown as typed, assistant text is markdown
            let body = match message.role {
                MessageRole::User => message
                    .content
                    .lines()
                    .map(|line| Line::from(Span::styled(line.to_string(), theme.normal())))
                    .collect(),
                MessageRole::Assistant => markdown_to_lines(&message.content, theme),
            };

            for line in &body {
                for wrapped in wrap_line(line, body_width) {
                    let mut spans = vec![Span::raw("  ")];
                    spans.extend(wrapped.spans);
                    all_lines.push(Line::from(spans));
                }
            }

            all_lines.push(Line::default());
        }

        if self.waiting {
            all_lines.push(Line::from(Span::styled(
                "⏳ Waiting for the workflow...",
                theme.warning(),
            )));
        }

        all_lines
    }
}

impl Default for ChatView {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ChatView {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border())
            .title(format!(" {} ", self.title));

        if self.messages.is_empty() && !self.waiting {
            let empty_message = Paragraph::new("No messages yet. Say hello to the workflow!")
                .block(block)
                .alignment(Alignment::Center)
                .style(theme.secondary());

            frame.render_widget(empty_message, area);
            return;
        }

        let content_width = area.width.saturating_sub(2) as usize;
        let content_height = area.height.saturating_sub(2) as usize;

        let all_lines = self.build_lines(content_width, theme);
        let total_lines = all_lines.len();
        let max_scroll = total_lines.saturating_sub(content_height);

        if self.auto_scroll || self.scroll_offset >= max_scroll {
            self.scroll_offset = max_scroll;
            self.auto_scroll = true;
        }

        let visible_lines: Vec<Line> = all_lines
            .into_iter()
            .skip(self.scroll_offset)
            .take(content_height)
            .collect();

        let paragraph = Paragraph::new(visible_lines).block(block);
        frame.render_widget(paragraph, area);
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Key(KeyEvent { code, .. }) => match code {
                KeyCode::Up => {
                    self.scroll_up(1);
                    true
                }
                KeyCode::Down => {
                    self.scroll_down(1);
                    true
                }
                KeyCode::PageUp => {
                    self.scroll_up(PAGE_SCROLL);
                    true
                }
                KeyCode::PageDown => {
                    self.scroll_down(PAGE_SCROLL);
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn title(&self) -> &str {
        "ChatView"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_build_lines_renders_roles_and_markdown() {
        let mut view = ChatView::new();
        view.sync_messages(vec![
            ChatMessage::user("status?"),
            ChatMessage::assistant("# OK\nAll good"),
        ]);

        let lines = texts(&view.build_lines(80, &Theme::dark()));

        assert!(lines[0].starts_with("👤 You "));
        assert_eq!(lines[1], "  status?");
        assert_eq!(lines[2], "");
        assert!(lines[3].starts_with("🤖 Workflow "));
        assert_eq!(&lines[4..7], &["  OK", "  ", "  All good"]);
    }

    #[test]
    fn test_waiting_indicator() {
        let mut view = ChatView::new();
        view.sync_messages(vec![ChatMessage::user("hi")]);
        view.set_waiting(true);

        let lines = texts(&view.build_lines(80, &Theme::dark()));
        assert_eq!(lines.last().map(String::as_str), Some("⏳ Waiting for the workflow..."));

        view.set_waiting(false);
        let lines = texts(&view.build_lines(80, &Theme::dark()));
        assert_eq!(lines.last().map(String::as_str), Some(""));
    }

    #[test]
    fn test_user_text_is_not_markdown() {
        let mut view = ChatView::new();
        view.sync_messages(vec![ChatMessage::user("# not a heading")]);

        let lines = texts(&view.build_lines(80, &Theme::dark()));
        assert_eq!(lines[1], "  # not a heading");
    }

    #[test]
    fn test_scrolling_stops_following() {
        let mut view = ChatView::new();
        view.scroll_up(3);
        assert!(!view.auto_scroll);

        view.scroll_to_bottom();
        assert!(view.auto_scroll);

        let handled = view.handle_event(&Event::Key(KeyEvent::from(KeyCode::PageUp)));
        assert!(handled);
        assert!(!view.auto_scroll);
    }
}
