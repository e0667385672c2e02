//! Convenience re-exports for common use.

pub use crate::chat::ChatClient;
pub use crate::config::ChatConfig;
pub use crate::error::{ChatError, Result};
pub use crate::models::{KnownModel, ModelDescriptor, ModelRegistry};
pub use crate::reconcile::{collect_text, TextStream};
pub use crate::routing::{classify, RoutingDecision};
pub use crate::transport::{HttpTransport, Transport};
pub use crate::types::{
    ChatCompletion, ChatMessage, ContentPart, ConversationTurn, Role, SearchMode, TextDelta,
};
pub use crate::usage::{FileUsageStore, OrderMode, UsageTracker};
