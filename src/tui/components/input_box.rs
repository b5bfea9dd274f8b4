use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::tui::{components::Component, Event, Theme};

const PLACEHOLDER: &str = "Type your message... (Enter: Send, Shift+Enter: Multiline)";
const BUSY_PLACEHOLDER: &str = "Waiting for the workflow to answer...";

#[derive(Debug, Clone)]
pub struct InputBox {
    input: Input,
    enabled: bool,
    is_multiline_mode: bool,
    lines: Vec<String>,
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
            enabled: true,
            is_multiline_mode: false,
            lines: Vec::new(),
        }
    }

    /// A disabled box keeps its content but ignores typing
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn clear(&mut self) {
        self.input.reset();
        self.lines.clear();
        self.is_multiline_mode = false;
    }

    pub fn get_content(&self) -> String {
        if self.is_multiline_mode {
            self.lines.join("\n")
        } else {
            self.input.value().to_string()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.get_content().trim().is_empty()
    }

    /// Rows needed including borders; grows with multiline input
    pub fn desired_height(&self) -> u16 {
        if self.is_multiline_mode {
            (self.lines.len() as u16).saturating_add(2).clamp(3, 10)
        } else {
            3
        }
    }

    fn enter_multiline_mode(&mut self) {
        self.lines = vec![self.input.value().to_string(), String::new()];
        self.input.reset();
        self.is_multiline_mode = true;
    }

    fn handle_multiline_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.lines.push(String::new());
                true
            }
            // plain Enter sends, the parent handles it
            KeyCode::Enter => false,
            KeyCode::Backspace => {
                let remove_line = self.lines.len() > 1
                    && self.lines.last().is_some_and(|line| line.is_empty());
                if remove_line {
                    self.lines.pop();
                } else if let Some(last_line) = self.lines.last_mut() {
                    last_line.pop();
                }
                true
            }
            KeyCode::Esc => {
                // back to single line, joining what was typed
                let content = self.lines.join(" ");
                self.input = Input::new(content.trim().to_string());
                self.lines.clear();
                self.is_multiline_mode = false;
                true
            }
            KeyCode::Char(c)
                if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                match self.lines.last_mut() {
                    Some(last_line) => last_line.push(c),
                    None => self.lines.push(c.to_string()),
                }
                true
            }
            _ => false,
        }
    }
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let border_style = if self.enabled {
            theme.accent()
        } else {
            theme.border()
        };

        let title = if self.is_multiline_mode {
            " Message (Multiline, Esc: single line) "
        } else {
            " Message "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title);

        let placeholder = if self.enabled { PLACEHOLDER } else { BUSY_PLACEHOLDER };

        if self.is_multiline_mode {
            let content: Vec<Line> = self.lines.iter().map(|line| Line::from(line.clone())).collect();
            let paragraph = Paragraph::new(content)
                .block(block)
                .wrap(Wrap { trim: false })
                .style(theme.normal());

            frame.render_widget(paragraph, area);
            return;
        }

        if self.input.value().is_empty() {
            let content = Line::from(Span::styled(placeholder, theme.secondary()));
            frame.render_widget(Paragraph::new(content).block(block).style(theme.normal()), area);
            if self.enabled {
                frame.set_cursor(area.x + 1, area.y + 1);
            }
            return;
        }

        let available_width = area.width.saturating_sub(2) as usize;
        let cursor_pos = self.input.visual_cursor();

        // Horizontal scroll keeps the cursor inside the box
        let scroll_offset = if cursor_pos >= available_width {
            cursor_pos.saturating_sub(available_width) + 1
        } else {
            0
        };

        let visible_text: String = self
            .input
            .value()
            .chars()
            .skip(scroll_offset)
            .take(available_width)
            .collect();
        let cursor_in_view = cursor_pos.saturating_sub(scroll_offset);

        let paragraph = Paragraph::new(Line::from(visible_text))
            .block(block)
            .style(theme.normal());
        frame.render_widget(paragraph, area);

        if self.enabled {
            let cursor_x = area.x + 1 + cursor_in_view as u16;
            if cursor_x < area.x + area.width.saturating_sub(1) {
                frame.set_cursor(cursor_x, area.y + 1);
            }
        }
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if !self.enabled {
            return false;
        }

        let Event::Key(key) = event else {
            return false;
        };

        if self.is_multiline_mode {
            return self.handle_multiline_key(*key);
        }

        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.enter_multiline_mode();
                true
            }
            KeyCode::Enter => false,
            // Leave global hotkeys to the app
            _ if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => false,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Esc => false,
            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown => false,
            _ => {
                self.input.handle_event(&crossterm::event::Event::Key(*key));
                true
            }
        }
    }

    fn title(&self) -> &str {
        "InputBox"
    }
}
