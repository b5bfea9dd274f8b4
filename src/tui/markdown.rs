//! Turns assistant markdown into styled ratatui lines and wraps them to the
//! width of the chat pane.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

use crate::tui::Theme;

const CODE_GUTTER: &str = "│ ";
const RULE_WIDTH: usize = 24;

/// Render `text` as markdown. Lines are not wrapped, see [`wrap_line`].
pub fn markdown_to_lines(text: &str, theme: &Theme) -> Vec<Line<'static>> {
    let mut builder = LineBuilder::new(theme);
    for event in Parser::new(text) {
        builder.handle(event);
    }
    builder.finish()
}

struct LineBuilder<'t> {
    theme: &'t Theme,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<Option<u64>>,
    in_code_block: bool,
}

impl<'t> LineBuilder<'t> {
    fn new(theme: &'t Theme) -> Self {
        Self {
            theme,
            lines: Vec::new(),
            current: Vec::new(),
            styles: vec![theme.normal()],
            lists: Vec::new(),
            in_code_block: false,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, patch: Style) {
        let style = self.style().patch(patch);
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn blank(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|line| !line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn text(&mut self, text: &str) {
        let style = self.style();
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) if self.in_code_block => {
                for line in text.lines() {
                    self.lines.push(Line::from(vec![
                        Span::styled(CODE_GUTTER, self.theme.secondary()),
                        Span::styled(line.to_string(), self.theme.code()),
                    ]));
                }
            }
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => self.text(&text),
            Event::Code(code) => {
                let style = self.theme.code();
                self.current.push(Span::styled(code.to_string(), style));
            }
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.blank();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(RULE_WIDTH),
                    self.theme.border(),
                )));
                self.lines.push(Line::default());
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.blank();
                let mut patch = self.theme.accent().add_modifier(Modifier::BOLD);
                if level == HeadingLevel::H1 {
                    patch = patch.add_modifier(Modifier::UNDERLINED);
                }
                self.push_style(patch);
            }
            Tag::CodeBlock(kind) => {
                self.blank();
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.lines
                            .push(Line::from(Span::styled(lang.to_string(), self.theme.secondary())));
                    }
                }
                self.in_code_block = true;
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let bullet = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let bullet = format!("{}. ", n);
                        *n += 1;
                        bullet
                    }
                    _ => "• ".to_string(),
                };
                self.current.push(Span::styled(
                    format!("{}{}", "  ".repeat(depth), bullet),
                    self.theme.accent(),
                ));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { .. } => {
                self.push_style(self.theme.accent().add_modifier(Modifier::UNDERLINED))
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.lines.push(Line::default());
                }
            }
            TagEnd::Heading(_) => {
                self.pop_style();
                self.flush();
                self.lines.push(Line::default());
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.lines.push(Line::default());
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.lines.push(Line::default());
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.pop_style()
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Word-wrap a styled line to `width` terminal columns. Words wider than a
/// whole line are split at character boundaries.
pub fn wrap_line(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
    let mut wrapper = Wrapper {
        width: width.max(1),
        lines: Vec::new(),
        current: Vec::new(),
        current_width: 0,
    };
    for span in &line.spans {
        for piece in span.content.split_inclusive(' ') {
            wrapper.push(piece, span.style);
        }
    }
    wrapper.finish()
}

struct Wrapper {
    width: usize,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    current_width: usize,
}

impl Wrapper {
    fn push(&mut self, piece: &str, style: Style) {
        let mut piece = piece;
        if self.current_width > 0 && self.current_width + piece.trim_end().width() > self.width {
            self.break_line();
            piece = piece.trim_start();
        }

        // current_width is 0 whenever this loop runs
        while piece.trim_end().width() > self.width {
            let split = split_at_width(piece, self.width);
            self.current.push(Span::styled(piece[..split].to_string(), style));
            self.break_line();
            piece = &piece[split..];
        }

        if !piece.is_empty() {
            self.current_width += piece.width();
            self.current.push(Span::styled(piece.to_string(), style));
        }
    }

    fn break_line(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.current)));
        self.current_width = 0;
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if !self.current.is_empty() || self.lines.is_empty() {
            self.break_line();
        }
        self.lines
    }
}

/// Byte index of the longest prefix of `text` fitting in `width` columns,
/// never less than one character.
fn split_at_width(text: &str, width: usize) -> usize {
    let mut used = 0;
    for (index, ch) in text.char_indices() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > width {
            return if index == 0 { ch.len_utf8() } else { index };
        }
        used += ch_width;
    }
    text.len()
}
