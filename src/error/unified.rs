//! Unified error classification and recovery.

use serde::{Deserialize, Serialize};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 401 / 403 from the backend.
    Authentication,
    /// Any other 4xx.
    Client,
    /// 5xx.
    Server,
    Network,
    MalformedResponse,
    Validation,
    Cancelled,
    Configuration,
    Storage,
}

/// Suggested recovery action.
///
/// There is deliberately no automatic retry variant: failed turns are
/// regenerated on explicit user request only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    Regenerate,
    SignIn,
    FixInput,
    CheckConfiguration,
    None,
}

/// Structured error body returned by a backend (`{error, message}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Parse a raw response body, returning `None` for anything that is not
    /// a JSON object with at least one of the known fields.
    pub fn parse(raw: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        let obj = value.as_object()?;
        let field = |name: &str| -> Option<String> {
            match obj.get(name)? {
                serde_json::Value::String(s) => Some(s.clone()),
                // Some backends nest `{error: {message}}`.
                serde_json::Value::Object(inner) => inner
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
                _ => None,
            }
        };
        let body = Self {
            error: field("error"),
            message: field("message"),
        };
        if body.error.is_none() && body.message.is_none() {
            None
        } else {
            Some(body)
        }
    }

    /// The most specific message available: `message`, then `error`.
    pub fn best_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| self.error.as_deref().filter(|e| !e.trim().is_empty()))
    }
}
