use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Action name the workflow webhook expects for chat turns
pub const SEND_MESSAGE_ACTION: &str = "sendMessage";

/// The single external collaborator: something that takes a chat request and
/// answers with JSON of unknown shape.
#[async_trait]
pub trait WorkflowEndpoint: Send + Sync {
    async fn send(&self, request: &WorkflowRequest) -> Result<serde_json::Value>;

    /// Human-readable target, used in logs
    fn describe(&self) -> String;
}

/// Body posted to the workflow webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRequest {
    pub session_id: String,
    pub action: String,
    pub chat_input: String,
}

impl WorkflowRequest {
    pub fn send_message(session_id: impl Into<String>, chat_input: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            action: SEND_MESSAGE_ACTION.to_string(),
            chat_input: chat_input.into(),
        }
    }
}
