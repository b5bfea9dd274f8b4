pub mod normalize;
pub mod session;
pub mod types;

pub use normalize::{normalize_response, ExtractionError, Extractor, EXTRACTORS};
pub use session::{ChatSession, SessionConfig};
pub use types::{ChatError, ChatMessage, FailureKind, MessageRole, TurnOutcome, TurnPhase};
