//! Configuration loaded from environment variables and CLI flags.

use std::env;
use std::time::Duration;

use chat_client::ApiConfig;
use chat_sync::PollConfig;

/// Everything the console needs before it can connect.
#[derive(Clone)]
pub struct ConsoleConfig {
    /// API session context (base URL, token, timeout).
    pub api: ApiConfig,
    /// Poll timer periods.
    pub poll: PollConfig,
    /// Login email, used when no token is configured.
    pub email: Option<String>,
    /// Login password.
    pub password: Option<String>,
}

/// Values given on the command line. Each one overrides its variable.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub thread_poll_secs: Option<u64>,
    pub unread_poll_secs: Option<u64>,
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CHAT_API_BASE` | API base URL | `http://localhost:8800/api/v1` |
    /// | `CHAT_API_TOKEN` | Bearer token | (none) |
    /// | `CHAT_API_TIMEOUT_SECS` | Request timeout | `30` |
    /// | `CHAT_EMAIL` | Login email | (none) |
    /// | `CHAT_PASSWORD` | Login password | (none) |
    /// | `CHAT_THREAD_POLL_SECS` | Thread reload period | `30` |
    /// | `CHAT_UNREAD_POLL_SECS` | Unread refresh period | `30` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api: ApiConfig::from_env()?,
            poll: PollConfig::from_env()?,
            email: non_empty_var("CHAT_EMAIL"),
            password: non_empty_var("CHAT_PASSWORD"),
        })
    }

    /// Apply command-line values on top of the environment.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self, ConfigError> {
        if let Some(base_url) = overrides.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(ConfigError::InvalidBaseUrl(base_url));
            }
            let token = self.api.token.take();
            let timeout = self.api.timeout;
            self.api = ApiConfig::new(base_url).with_timeout(timeout);
            self.api.token = token;
        }
        if let Some(token) = overrides.token {
            self.api.token = Some(token);
        }
        if overrides.email.is_some() {
            self.email = overrides.email;
        }
        if overrides.password.is_some() {
            self.password = overrides.password;
        }
        if let Some(secs) = overrides.thread_poll_secs {
            self.poll.thread_interval = positive_secs("--thread-poll-secs", secs)?;
        }
        if let Some(secs) = overrides.unread_poll_secs {
            self.poll.unread_interval = positive_secs("--unread-poll-secs", secs)?;
        }
        Ok(self)
    }

    /// Email and password, when both are known.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ConsoleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleConfig")
            .field("api", &self.api)
            .field("poll", &self.poll)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn positive_secs(flag: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::ZeroInterval(flag));
    }
    Ok(Duration::from_secs(secs))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Api(#[from] chat_client::ConfigError),

    #[error(transparent)]
    Poll(#[from] chat_sync::ConfigError),

    #[error("--base-url must be an http(s) URL, got {0:?}")]
    InvalidBaseUrl(String),

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}
