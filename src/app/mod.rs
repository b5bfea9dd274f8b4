pub mod config;
pub mod state;

pub use config::{AppConfig, ChatConfig, EndpointConfig, LogsConfig, UIConfig};
pub use state::AppState;
