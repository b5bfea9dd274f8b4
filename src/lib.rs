pub mod app;
pub mod chat;
pub mod error;
pub mod logging;
pub mod logs;
pub mod platform;
pub mod tui;
pub mod workflow;

pub use error::{Error, Result};
