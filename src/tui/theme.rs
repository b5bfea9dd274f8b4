use ratatui::style::{Color, Modifier, Style};

use crate::logs::LogLevel;

#[derive(Clone, Debug)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub border: Color,
    pub highlight: Color,
    pub secondary: Color,
}

impl Theme {
    /// Look up a theme by its config name, falling back to dark
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "matrix" => Self::matrix(),
            _ => Self::dark(),
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb(40, 44, 52),
            fg: Color::Rgb(171, 178, 191),
            accent: Color::Rgb(97, 175, 239),
            success: Color::Rgb(152, 195, 121),
            warning: Color::Rgb(229, 192, 123),
            error: Color::Rgb(224, 108, 117),
            border: Color::Rgb(92, 99, 112),
            highlight: Color::Rgb(86, 182, 194),
            secondary: Color::Rgb(130, 137, 151),
        }
    }

    pub fn light() -> Self {
        Self {
            bg: Color::Rgb(250, 250, 250),
            fg: Color::Rgb(60, 60, 60),
            accent: Color::Rgb(0, 122, 255),
            success: Color::Rgb(40, 167, 69),
            warning: Color::Rgb(204, 145, 0),
            error: Color::Rgb(220, 53, 69),
            border: Color::Rgb(200, 200, 200),
            highlight: Color::Rgb(23, 162, 184),
            secondary: Color::Rgb(108, 117, 125),
        }
    }

    pub fn matrix() -> Self {
        Self {
            bg: Color::Black,
            fg: Color::Green,
            accent: Color::Rgb(0, 255, 0),
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            border: Color::Green,
            highlight: Color::Rgb(0, 255, 0),
            secondary: Color::Rgb(0, 150, 0),
        }
    }

    // Style helpers
    pub fn normal(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn success(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn warning(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn highlight(&self) -> Style {
        Style::default().fg(self.highlight).add_modifier(Modifier::BOLD)
    }

    pub fn secondary(&self) -> Style {
        Style::default().fg(self.secondary)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn selected(&self) -> Style {
        Style::default().fg(self.bg).bg(self.accent)
    }

    pub fn code(&self) -> Style {
        Style::default().fg(self.highlight)
    }

    pub fn level(&self, level: LogLevel) -> Style {
        match level {
            LogLevel::Info => self.accent(),
            LogLevel::Warn => self.warning(),
            LogLevel::Error => self.error(),
            LogLevel::Debug => self.secondary(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
