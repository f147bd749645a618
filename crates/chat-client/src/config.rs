//! Configuration types for chat-client.

use std::env;
use std::time::Duration;

/// Base URL used when `CHAT_API_BASE` is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8800/api/v1";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Session context for talking to the chat API.
///
/// Holds the base URL and the bearer token. Every client built from the same
/// config shares one identity; there is no ambient token store.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL including the API prefix (e.g., "http://localhost:8800/api/v1").
    pub base_url: String,
    /// Bearer token. None until logged in.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Create an unauthenticated configuration with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a configuration with an existing bearer token.
    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::new(base_url)
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CHAT_API_BASE` | API base URL | `http://localhost:8800/api/v1` |
    /// | `CHAT_API_TOKEN` | Bearer token | (none) |
    /// | `CHAT_API_TIMEOUT_SECS` | Request timeout | `30` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("CHAT_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        let token = env::var("CHAT_API_TOKEN").ok().filter(|t| !t.is_empty());

        let timeout = match env::var("CHAT_API_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidNumber("CHAT_API_TIMEOUT_SECS", v))?,
            Err(_) => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            token,
            timeout,
            ..Self::new(base_url)
        })
    }

    /// Login endpoint.
    pub fn login_url(&self) -> String {
        format!("{}/auth/login", self.base_url)
    }

    /// Current-agent endpoint.
    pub fn me_url(&self) -> String {
        format!("{}/auth/me", self.base_url)
    }

    /// Agent list endpoint, with an optional role filter.
    pub fn agents_url(&self, role: Option<&str>) -> String {
        match role {
            Some(role) => format!(
                "{}/agents?role={}",
                self.base_url,
                urlencoding::encode(role)
            ),
            None => format!("{}/agents", self.base_url),
        }
    }

    /// Conversation summaries endpoint.
    pub fn conversations_url(&self) -> String {
        format!("{}/chats/agents", self.base_url)
    }

    /// Thread endpoint for one peer (GET to load, POST to send).
    pub fn thread_url(&self, peer_id: &str) -> String {
        format!(
            "{}/chats/agents/{}",
            self.base_url,
            urlencoding::encode(peer_id)
        )
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CHAT_API_BASE must be an http(s) URL, got {0:?}")]
    InvalidBaseUrl(String),

    #[error("{0} must be a whole number of seconds, got {1:?}")]
    InvalidNumber(&'static str, String),
}
