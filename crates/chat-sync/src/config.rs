//! Polling configuration.

use std::env;
use std::time::Duration;

/// Default period for both timers.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Periods of the two poll timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// How often the selected thread is reloaded.
    pub thread_interval: Duration,
    /// How often unread counts are rebuilt.
    pub unread_interval: Duration,
}

impl PollConfig {
    /// Use the same period for both timers.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            thread_interval: interval,
            unread_interval: interval,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CHAT_THREAD_POLL_SECS` | Thread reload period | `30` |
    /// | `CHAT_UNREAD_POLL_SECS` | Unread refresh period | `30` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            thread_interval: secs_from_env("CHAT_THREAD_POLL_SECS")?,
            unread_interval: secs_from_env("CHAT_UNREAD_POLL_SECS")?,
        })
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::with_interval(DEFAULT_POLL_INTERVAL)
    }
}

fn secs_from_env(name: &'static str) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(value) => parse_secs(name, &value),
        Err(_) => Ok(DEFAULT_POLL_INTERVAL),
    }
}

fn parse_secs(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::ZeroInterval(name)),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(ConfigError::InvalidNumber(name, value.to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be a whole number of seconds, got {1:?}")]
    InvalidNumber(&'static str, String),

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_thirty_seconds() {
        let config = PollConfig::default();
        assert_eq!(config.thread_interval, Duration::from_secs(30));
        assert_eq!(config.unread_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs("X", " 5 ").unwrap(), Duration::from_secs(5));
        assert!(matches!(parse_secs("X", "0"), Err(ConfigError::ZeroInterval("X"))));
        assert!(matches!(
            parse_secs("X", "soon"),
            Err(ConfigError::InvalidNumber("X", _))
        ));
    }

    #[test]
    fn test_from_env() {
        env::set_var("CHAT_THREAD_POLL_SECS", "10");
        env::remove_var("CHAT_UNREAD_POLL_SECS");
        let config = PollConfig::from_env().unwrap();
        assert_eq!(config.thread_interval, Duration::from_secs(10));
        assert_eq!(config.unread_interval, DEFAULT_POLL_INTERVAL);

        env::set_var("CHAT_UNREAD_POLL_SECS", "0");
        assert!(PollConfig::from_env().is_err());

        env::remove_var("CHAT_THREAD_POLL_SECS");
        env::remove_var("CHAT_UNREAD_POLL_SECS");
    }
}
