pub mod broadcaster;
pub mod entry;
pub mod markdown;

pub use broadcaster::{in_delivery, LogBroadcaster, Subscription, DEFAULT_LOG_CAPACITY};
pub use entry::{LogEntry, LogLevel};
pub use markdown::render_markdown;
