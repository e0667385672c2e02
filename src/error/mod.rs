//! Error types for chatroute.

pub mod unified;

pub use unified::{ErrorBody, ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all chatroute operations.
///
/// Classification and request building only ever fail with
/// [`ChatError::Validation`]; everything else originates in the transport,
/// the response reconciler or the persistence layer.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Backend returned {status} {status_text}")]
    Transport {
        status: u16,
        status_text: String,
        body: Option<ErrorBody>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChatError {
    /// Create a transport error from a status line and a raw response body.
    ///
    /// The body is parsed best-effort; anything that is not a JSON object is
    /// dropped and callers fall back to the status text.
    pub fn transport(status: u16, status_text: impl Into<String>, raw_body: &str) -> Self {
        Self::Transport {
            status,
            status_text: status_text.into(),
            body: ErrorBody::parse(raw_body),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                400..=499 => ErrorCategory::Client,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Client,
            },
            Self::Network(_) => ErrorCategory::Network,
            Self::MalformedResponse(_) | Self::Serialization(_) => {
                ErrorCategory::MalformedResponse
            }
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Storage(_) | Self::Io(_) => ErrorCategory::Storage,
        }
    }

    /// Suggest the recovery action offered to the user.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::SignIn,
            ErrorCategory::Server | ErrorCategory::Network | ErrorCategory::MalformedResponse => {
                RecoverySuggestion::Regenerate
            }
            ErrorCategory::Client | ErrorCategory::Validation => RecoverySuggestion::FixInput,
            ErrorCategory::Configuration | ErrorCategory::Storage => {
                RecoverySuggestion::CheckConfiguration
            }
            ErrorCategory::Cancelled => RecoverySuggestion::None,
        }
    }

    /// Human-readable message for display next to the regenerate action.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport {
                status: 401 | 403, ..
            } => "Your session has expired. Please sign in again.".to_string(),
            Self::Transport {
                status: 500..=599,
                ..
            } => "The service is having trouble right now. Please try again later.".to_string(),
            Self::Transport {
                status_text, body, ..
            } => body
                .as_ref()
                .and_then(ErrorBody::best_message)
                .map(str::to_string)
                .unwrap_or_else(|| status_text.clone()),
            Self::Network(_) => {
                "Could not reach the service. Check your connection and regenerate.".to_string()
            }
            Self::MalformedResponse(_) | Self::Serialization(_) => {
                "The response could not be read. Please regenerate.".to_string()
            }
            Self::Validation(message) => message.clone(),
            Self::Cancelled => "Generation stopped.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ChatError>;
