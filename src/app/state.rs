use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use crate::app::config::AppConfig;
use crate::chat::ChatSession;
use crate::error::Result;
use crate::logs::LogBroadcaster;
use crate::workflow::{HttpWorkflowEndpoint, WorkflowEndpoint};

/// Everything the UI shares: configuration, the one log broadcaster of the
/// process and the current chat session.
pub struct AppState {
    config: AppConfig,
    logs: Arc<LogBroadcaster>,
    endpoint: Arc<dyn WorkflowEndpoint>,
    session: RwLock<Arc<ChatSession>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let endpoint = HttpWorkflowEndpoint::from_config(&config.endpoint)?;
        Ok(Self::with_endpoint(config, Arc::new(endpoint)))
    }

    pub fn with_endpoint(config: AppConfig, endpoint: Arc<dyn WorkflowEndpoint>) -> Self {
        info!("Initializing application state");

        let logs = Arc::new(LogBroadcaster::new(config.logs.capacity));
        let session = Arc::new(ChatSession::new(
            Arc::clone(&endpoint),
            Arc::clone(&logs),
            config.to_session_config(),
        ));

        Self {
            config,
            logs,
            endpoint,
            session: RwLock::new(session),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn logs(&self) -> Arc<LogBroadcaster> {
        Arc::clone(&self.logs)
    }

    pub fn session(&self) -> Arc<ChatSession> {
        Arc::clone(&self.session.read())
    }

    /// Replace the current conversation with a fresh one (new session id).
    /// A turn still running on the old session finishes on its own.
    pub fn start_new_session(&self) -> Arc<ChatSession> {
        let session = Arc::new(ChatSession::new(
            Arc::clone(&self.endpoint),
            Arc::clone(&self.logs),
            self.config.to_session_config(),
        ));
        *self.session.write() = Arc::clone(&session);
        info!("Started new chat session {}", session.id());
        session
    }

    pub fn endpoint_description(&self) -> String {
        self.endpoint.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_default_config() {
        let state = AppState::new(AppConfig::default()).unwrap();
        assert_eq!(state.logs().capacity(), AppConfig::default().logs.capacity);
        assert_eq!(state.session().message_count(), 0);
        assert_eq!(state.endpoint_description(), "http://localhost:5678/webhook/test-chat");
    }

    #[test]
    fn test_new_session_has_new_id_and_shares_logs() {
        let state = AppState::new(AppConfig::default()).unwrap();
        let first = state.session();
        let second = state.start_new_session();

        assert_ne!(first.id(), second.id());
        assert_eq!(state.session().id(), second.id());
        // one "Chat session initialized" entry per session
        assert_eq!(state.logs().len(), 2);
    }
}
