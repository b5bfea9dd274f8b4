use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Represents a single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}

/// Role of the message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Where a session is within the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Sending,
    Succeeded,
    Failed,
}

/// Why a turn ended with a notice instead of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The request was rejected, the network failed or the status was not 2xx
    Transport(String),
    /// The response held nothing that could be displayed
    Extraction(String),
}

/// Result of a completed turn. Both variants mean an assistant message was
/// appended to the history.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Replied(ChatMessage),
    Failed {
        notice: ChatMessage,
        kind: FailureKind,
    },
}

impl TurnOutcome {
    pub fn message(&self) -> &ChatMessage {
        match self {
            TurnOutcome::Replied(message) => message,
            TurnOutcome::Failed { notice, .. } => notice,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TurnOutcome::Replied(_))
    }
}

/// Reasons a send is refused before anything happens
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyInput,

    #[error("A message is already being sent in this session")]
    TurnInProgress,
}

impl From<ChatError> for Error {
    fn from(err: ChatError) -> Self {
        Error::Chat(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_creation() {
        let message = ChatMessage::user("Hello, world!");
        assert_eq!(message.role, MessageRole::User);
        assert_eq!(message.content, "Hello, world!");
        assert!(message.is_user());
        assert!(!ChatMessage::assistant("hi").is_user());
    }

    #[test]
    fn test_role_serialization() {
        let value = serde_json::to_value(ChatMessage::assistant("ok")).unwrap();
        assert_eq!(value["role"], "assistant");
    }

    #[test]
    fn test_turn_outcome_message() {
        let outcome = TurnOutcome::Failed {
            notice: ChatMessage::assistant("Sorry"),
            kind: FailureKind::Transport("refused".to_string()),
        };
        assert!(!outcome.is_success());
        assert_eq!(outcome.message().content, "Sorry");
    }

    #[test]
    fn test_chat_error_conversion() {
        let err: Error = ChatError::TurnInProgress.into();
        assert!(err.to_string().contains("already being sent"));
    }
}
