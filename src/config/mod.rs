//! Configuration system (layered: defaults > TOML file > env).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};
use crate::routing::RoutingDecision;
use crate::usage::store::default_data_dir;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// API path per routing decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EndpointPaths {
    pub file_analysis: String,
    pub audio_transcription: String,
    pub knowledge_base: String,
    pub direct_agent: String,
    pub tool_aware_search: String,
    pub standard: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            file_analysis: "/api/chat/file".into(),
            audio_transcription: "/api/chat/transcribe".into(),
            knowledge_base: "/api/chat/bot".into(),
            direct_agent: "/api/chat/agent".into(),
            tool_aware_search: "/api/chat/search".into(),
            standard: "/api/chat".into(),
        }
    }
}

impl EndpointPaths {
    pub fn path_for(&self, decision: RoutingDecision) -> &str {
        match decision {
            RoutingDecision::FileAnalysis => &self.file_analysis,
            RoutingDecision::AudioTranscription => &self.audio_transcription,
            RoutingDecision::KnowledgeBase => &self.knowledge_base,
            RoutingDecision::DirectAgent => &self.direct_agent,
            RoutingDecision::ToolAwareSearch => &self.tool_aware_search,
            RoutingDecision::Standard => &self.standard,
        }
    }
}

/// Client configuration.
///
/// Resolution order, lowest to highest: built-in defaults, TOML file,
/// environment variables (`CHATROUTE_*`, with `.env` loaded first).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub default_temperature: f64,
    pub request_timeout_secs: u64,
    /// Opaque caller context forwarded as `user` on every request.
    pub user_context: String,
    pub endpoints: EndpointPaths,
    pub data_dir: PathBuf,
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("default_temperature", &self.default_temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_context", &self.user_context)
            .field("endpoints", &self.endpoints)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            default_temperature: DEFAULT_TEMPERATURE,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_context: String::new(),
            endpoints: EndpointPaths::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl ChatConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_user_context(mut self, context: impl Into<String>) -> Self {
        self.user_context = context.into();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Parse a TOML document over the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| ChatError::Configuration(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ChatError::Configuration(format!("{}: {e}", path.as_ref().display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults, then the TOML file when given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay `CHATROUTE_*` values read through `lookup`.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("CHATROUTE_BASE_URL") {
            self.base_url = url;
        }
        if let Some(key) = lookup("CHATROUTE_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(raw) = lookup("CHATROUTE_DEFAULT_TEMPERATURE") {
            self.default_temperature = raw.trim().parse().map_err(|_| {
                ChatError::Configuration(format!(
                    "CHATROUTE_DEFAULT_TEMPERATURE must be a number, got '{raw}'"
                ))
            })?;
        }
        if let Some(raw) = lookup("CHATROUTE_TIMEOUT_SECS") {
            self.request_timeout_secs = raw.trim().parse().map_err(|_| {
                ChatError::Configuration(format!(
                    "CHATROUTE_TIMEOUT_SECS must be a whole number, got '{raw}'"
                ))
            })?;
        }
        if let Some(context) = lookup("CHATROUTE_USER_CONTEXT") {
            self.user_context = context;
        }
        if let Some(dir) = lookup("CHATROUTE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Full URL for a routing decision.
    pub fn endpoint_url(&self, decision: RoutingDecision) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.endpoints.path_for(decision)
        )
    }
}
