use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::info;
use url::Url;

use crate::chat::SessionConfig;
use crate::error::{Error, Result};
use crate::logs::DEFAULT_LOG_CAPACITY;
use crate::platform::AppPaths;

pub const DEFAULT_WORKFLOW_URL: &str = "http://localhost:5678/webhook/test-chat";
pub const ENV_PREFIX: &str = "FLOWCHAT";

const THEMES: &[&str] = &["dark", "light", "matrix"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: EndpointConfig,
    pub chat: ChatConfig,
    pub logs: LogsConfig,
    pub ui: UIConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    pub timeout_seconds: Option<u64>, // None = wait for as long as the webhook takes
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub preview_chars: usize,
    pub greeting: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UIConfig {
    pub theme: String,
    pub tick_rate_ms: u64,
    pub show_log_details: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WORKFLOW_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            preview_chars: session.preview_chars,
            greeting: session.greeting,
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            tick_rate_ms: 250,
            show_log_details: true,
        }
    }
}

impl AppConfig {
    pub async fn load(paths: &AppPaths) -> Result<Self> {
        Self::load_from(&paths.config_file()).await
    }

    /// Load `path`, layering `FLOWCHAT__SECTION__KEY` environment variables
    /// on top. A default file is written first when none exists.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found, creating default configuration");
            Self::default().save_to(path).await?;
        }

        info!("Loading configuration from: {:?}", path);

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        info!("Saving configuration to: {:?}", path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let config_content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(config::ConfigError::Message(e.to_string())))?;

        fs::write(path, config_content).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.endpoint.url).map_err(|e| {
            Error::validation(format!("Invalid endpoint url '{}': {}", self.endpoint.url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::validation("Endpoint url must use http or https"));
        }

        if self.endpoint.timeout_seconds == Some(0) {
            return Err(Error::validation("Endpoint timeout must be at least one second"));
        }

        if self.logs.capacity == 0 {
            return Err(Error::validation("Log capacity must be at least 1"));
        }

        if self.chat.preview_chars == 0 || self.chat.preview_chars > 1000 {
            return Err(Error::validation("Preview length must be between 1 and 1000"));
        }

        if !THEMES.contains(&self.ui.theme.as_str()) {
            return Err(Error::validation(format!(
                "Unknown theme '{}', expected one of {}",
                self.ui.theme,
                THEMES.join(", ")
            )));
        }

        if self.ui.tick_rate_ms < 10 || self.ui.tick_rate_ms > 5000 {
            return Err(Error::validation("Tick rate must be between 10 and 5000 ms"));
        }

        Ok(())
    }

    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            preview_chars: self.chat.preview_chars,
            greeting: self.chat.greeting.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint.url, DEFAULT_WORKFLOW_URL);
        assert_eq!(config.endpoint.timeout_seconds, None);
        assert_eq!(config.logs.capacity, DEFAULT_LOG_CAPACITY);
        assert_eq!(config.chat.preview_chars, 50);
        assert_eq!(config.ui.theme, "dark");
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.endpoint.url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logs.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.ui.theme = "neon".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.endpoint.timeout_seconds = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_session_config_conversion() {
        let mut config = AppConfig::default();
        config.chat.preview_chars = 20;
        config.chat.greeting = Some("Hello".to_string());

        let session = config.to_session_config();
        assert_eq!(session.preview_chars, 20);
        assert_eq!(session.greeting.as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = AppConfig::load_from(&path).await.unwrap();

        assert!(path.exists());
        assert_eq!(config.endpoint.url, DEFAULT_WORKFLOW_URL);
    }

    #[tokio::test]
    async fn test_load_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[endpoint]\nurl = \"https://flows.example.com/webhook/chat\"\ntimeout_seconds = 30\n\n[logs]\ncapacity = 200\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).await.unwrap();

        assert_eq!(config.endpoint.url, "https://flows.example.com/webhook/chat");
        assert_eq!(config.endpoint.timeout_seconds, Some(30));
        assert_eq!(config.logs.capacity, 200);
        assert_eq!(config.chat.preview_chars, 50);
        assert!(config.ui.show_log_details);
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logs]\ncapacity = 0\n").unwrap();

        assert!(AppConfig::load_from(&path).await.is_err());
    }
}
