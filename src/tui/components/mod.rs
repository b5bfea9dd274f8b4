pub mod chat_view;
pub mod help_popup;
pub mod input_box;
pub mod log_view;
pub mod status_bar;

use crate::tui::{Event, Theme};
use ratatui::{layout::Rect, Frame};

pub use chat_view::ChatView;
pub use help_popup::HelpPopup;
pub use input_box::InputBox;
pub use log_view::LogView;
pub use status_bar::StatusBar;

/// Base trait for all TUI components
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Returns true when the event was consumed
    fn handle_event(&mut self, event: &Event) -> bool;

    /// Name used in debug logs
    fn title(&self) -> &str {
        "Component"
    }
}
