use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::normalize::normalize_response;
use crate::chat::types::{ChatError, ChatMessage, FailureKind, TurnOutcome, TurnPhase};
use crate::logs::LogBroadcaster;
use crate::workflow::{WorkflowEndpoint, WorkflowRequest};

pub const TRANSPORT_FAILURE_NOTICE: &str = "Sorry, there was an error processing your message.";
pub const EXTRACTION_FAILURE_NOTICE: &str =
    "Sorry, the workflow returned a response that could not be displayed.";

/// Configuration for a chat session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How many characters of the user's text are echoed into the log
    pub preview_chars: usize,
    /// Assistant message shown before the first turn
    pub greeting: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preview_chars: 50,
            greeting: None,
        }
    }
}

struct SessionState {
    messages: Vec<ChatMessage>,
    phase: TurnPhase,
}

/// One conversation with the workflow: message history, a stable session id
/// and at most one turn in flight.
pub struct ChatSession {
    id: String,
    endpoint: Arc<dyn WorkflowEndpoint>,
    logs: Arc<LogBroadcaster>,
    config: SessionConfig,
    state: Mutex<SessionState>,
}

impl ChatSession {
    pub fn new(
        endpoint: Arc<dyn WorkflowEndpoint>,
        logs: Arc<LogBroadcaster>,
        config: SessionConfig,
    ) -> Self {
        let id = Uuid::new_v4().to_string();

        let mut messages = Vec::new();
        if let Some(greeting) = config.greeting.as_deref().filter(|g| !g.trim().is_empty()) {
            messages.push(ChatMessage::assistant(greeting));
        }

        logs.info(
            "Chat session initialized",
            Some(json!({ "sessionId": id, "endpoint": endpoint.describe() })),
        );
        info!("Created chat session {}", id);

        Self {
            id,
            endpoint,
            logs,
            config,
            state: Mutex::new(SessionState {
                messages,
                phase: TurnPhase::Idle,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Snapshot of the conversation so far
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().messages.clone()
    }

    pub fn message_count(&self) -> usize {
        self.state.lock().messages.len()
    }

    pub fn phase(&self) -> TurnPhase {
        self.state.lock().phase
    }

    pub fn is_sending(&self) -> bool {
        self.phase() == TurnPhase::Sending
    }

    /// Run one turn: record the user's text, ask the workflow, record the
    /// answer or a failure notice.
    ///
    /// Refused without any side effect when the text is blank or another
    /// turn is still in flight. Transport and extraction failures are not
    /// errors here; they end the turn with an assistant notice.
    pub async fn send(&self, text: &str) -> Result<TurnOutcome, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }

        {
            let mut state = self.state.lock();
            if state.phase != TurnPhase::Idle {
                debug!("Rejected send on session {}: turn in progress", self.id);
                return Err(ChatError::TurnInProgress);
            }
            state.messages.push(ChatMessage::user(text));
            state.phase = TurnPhase::Sending;
        }
        debug!("Session {} -> Sending", self.id);

        self.logs.info(
            "Sending message to workflow",
            Some(json!({
                "sessionId": self.id,
                "preview": preview(text, self.config.preview_chars),
            })),
        );

        let request = WorkflowRequest::send_message(self.id.as_str(), text);
        self.logs.debug(
            "Request payload",
            Some(json!({
                "sessionId": request.session_id,
                "action": request.action,
                "chatInput": preview(text, self.config.preview_chars),
            })),
        );
        let start_time = Instant::now();

        let outcome = match self.endpoint.send(&request).await {
            Ok(payload) => match normalize_response(payload) {
                Ok(content) => {
                    let latency_ms = start_time.elapsed().as_millis() as u64;
                    let output_length = content.chars().count();
                    let reply = ChatMessage::assistant(content);

                    self.finish(reply.clone(), TurnPhase::Succeeded);
                    self.logs.info(
                        "Received response from workflow",
                        Some(json!({
                            "outputLength": output_length,
                            "latencyMs": latency_ms,
                        })),
                    );
                    TurnOutcome::Replied(reply)
                }
                Err(err) => {
                    self.logs.error(
                        "Could not extract content from response",
                        Some(json!({ "payloadShape": err.shape(), "error": err.to_string() })),
                    );
                    let notice = ChatMessage::assistant(EXTRACTION_FAILURE_NOTICE);
                    self.finish(notice.clone(), TurnPhase::Failed);
                    TurnOutcome::Failed {
                        notice,
                        kind: FailureKind::Extraction(err.to_string()),
                    }
                }
            },
            Err(err) => {
                self.logs.error(
                    "Workflow request failed",
                    Some(json!({ "error": err.to_string() })),
                );
                let notice = ChatMessage::assistant(TRANSPORT_FAILURE_NOTICE);
                self.finish(notice.clone(), TurnPhase::Failed);
                TurnOutcome::Failed {
                    notice,
                    kind: FailureKind::Transport(err.to_string()),
                }
            }
        };

        self.state.lock().phase = TurnPhase::Idle;
        debug!("Session {} -> Idle", self.id);

        Ok(outcome)
    }

    fn finish(&self, message: ChatMessage, phase: TurnPhase) {
        let mut state = self.state.lock();
        state.messages.push(message);
        state.phase = phase;
        debug!("Session {} -> {:?}", self.id, phase);
    }
}

/// First `limit` characters of `text`, with an ellipsis when cut
fn preview(text: &str, limit: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
