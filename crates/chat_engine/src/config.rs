use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Url;
use thiserror::Error;

use crate::{ClientSettings, PollSettings};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_USER_ID: &str = "68714a69df9144af1173a76b";

const ENV_BASE_URL: &str = "CHAT_API_URL";
const ENV_USER_ID: &str = "CHAT_USER_ID";
const ENV_POLL_INTERVAL_MS: &str = "CHAT_POLL_INTERVAL_MS";
const ENV_POLL_MAX_ATTEMPTS: &str = "CHAT_POLL_MAX_ATTEMPTS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid base url {value:?}: {reason}")]
    InvalidBaseUrl { value: String, reason: String },
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: String, value: String },
    #[error("max poll attempts must be at least 1")]
    ZeroAttempts,
    #[error("user id must not be empty")]
    EmptyUserId,
}

#[derive(Clone)]
pub struct EngineConfig {
    pub base_url: String,
    pub user_id: String,
    pub client: ClientSettings,
    pub poll: PollSettings,
    /// Timestamp stamped on messages the backend accepts.
    pub created_utc: Arc<dyn Fn() -> String + Send + Sync>,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("base_url", &self.base_url)
            .field("user_id", &self.user_id)
            .field("client", &self.client)
            .field("poll", &self.poll)
            .finish_non_exhaustive()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            client: ClientSettings::default(),
            poll: PollSettings::default(),
            created_utc: Arc::new(|| Utc::now().to_rfc3339()),
        }
    }
}

impl EngineConfig {
    /// Reads `CHAT_API_URL`, `CHAT_USER_ID`, `CHAT_POLL_INTERVAL_MS` and
    /// `CHAT_POLL_MAX_ATTEMPTS`, falling back to defaults for unset keys.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(user_id) = lookup(ENV_USER_ID) {
            config.user_id = user_id;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            config.poll.interval = Duration::from_millis(parse_number(ENV_POLL_INTERVAL_MS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_POLL_MAX_ATTEMPTS) {
            let attempts = parse_number(ENV_POLL_MAX_ATTEMPTS, &raw)?;
            config.poll.max_attempts = u32::try_from(attempts).map_err(|_| {
                ConfigError::InvalidNumber {
                    key: ENV_POLL_MAX_ATTEMPTS.to_string(),
                    value: raw.clone(),
                }
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|err| ConfigError::InvalidBaseUrl {
            value: self.base_url.clone(),
            reason: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                value: self.base_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        if self.poll.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::EmptyUserId);
        }
        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{ConfigError, EngineConfig, DEFAULT_BASE_URL, DEFAULT_USER_ID};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.user_id, DEFAULT_USER_ID);
        assert_eq!(config.poll.max_attempts, 10);
        assert_eq!(config.poll.interval, Duration::from_millis(10_000));
        assert!(!(config.created_utc)().is_empty());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("CHAT_API_URL", "https://chat.example.com/base"),
            ("CHAT_USER_ID", "u-42"),
            ("CHAT_POLL_INTERVAL_MS", " 250 "),
            ("CHAT_POLL_MAX_ATTEMPTS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://chat.example.com/base");
        assert_eq!(config.user_id, "u-42");
        assert_eq!(config.poll.interval, Duration::from_millis(250));
        assert_eq!(config.poll.max_attempts, 3);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_lookup(lookup(&[("CHAT_POLL_INTERVAL_MS", "soon")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert_eq!(
            EngineConfig::from_lookup(lookup(&[("CHAT_POLL_MAX_ATTEMPTS", "0")])).unwrap_err(),
            ConfigError::ZeroAttempts
        );
        assert!(matches!(
            EngineConfig::from_lookup(lookup(&[("CHAT_API_URL", "ftp://files")])),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            EngineConfig::from_lookup(lookup(&[("CHAT_API_URL", "localhost")])),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert_eq!(
            EngineConfig::from_lookup(lookup(&[("CHAT_USER_ID", "  ")])).unwrap_err(),
            ConfigError::EmptyUserId
        );
    }
}
