use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8787";
pub const DEFAULT_TRANSCRIBE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_GENERATE_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_REDACT_TIMEOUT_SECS: u64 = 10;

const API_URL_VAR: &str = "SCRIBE_API_URL";
const API_KEY_VAR: &str = "SCRIBE_API_KEY";
const TRANSCRIBE_TIMEOUT_VAR: &str = "SCRIBE_TRANSCRIBE_TIMEOUT_SECS";
const GENERATE_TIMEOUT_VAR: &str = "SCRIBE_GENERATE_TIMEOUT_SECS";
const REDACT_TIMEOUT_VAR: &str = "SCRIBE_REDACT_TIMEOUT_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Service URL is empty")]
    EmptyBaseUrl,

    #[error("Service URL must start with http:// or https://: {0}")]
    InvalidBaseUrl(String),
}

/// Where the collaborators live and how long each call may take
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub transcribe_timeout: Duration,
    pub generate_timeout: Duration,
    pub redact_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            transcribe_timeout: Duration::from_secs(DEFAULT_TRANSCRIBE_TIMEOUT_SECS),
            generate_timeout: Duration::from_secs(DEFAULT_GENERATE_TIMEOUT_SECS),
            redact_timeout: Duration::from_secs(DEFAULT_REDACT_TIMEOUT_SECS),
        }
    }
}

impl ServiceConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(API_URL_VAR)
            .map(|url| url.trim().to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if base_url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        let api_key = lookup(API_KEY_VAR)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let config = Self {
            base_url,
            api_key,
            transcribe_timeout: timeout_secs(&lookup, TRANSCRIBE_TIMEOUT_VAR, DEFAULT_TRANSCRIBE_TIMEOUT_SECS),
            generate_timeout: timeout_secs(&lookup, GENERATE_TIMEOUT_VAR, DEFAULT_GENERATE_TIMEOUT_SECS),
            redact_timeout: timeout_secs(&lookup, REDACT_TIMEOUT_VAR, DEFAULT_REDACT_TIMEOUT_SECS),
        };

        tracing::info!(
            "Service config loaded: url={}, api_key={}, timeouts={}s/{}s/{}s",
            config.base_url,
            config.api_key.is_some(),
            config.transcribe_timeout.as_secs(),
            config.generate_timeout.as_secs(),
            config.redact_timeout.as_secs()
        );

        Ok(config)
    }
}

fn timeout_secs<F>(lookup: &F, key: &str, default: u64) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                tracing::warn!("Invalid {}='{}', using {}s", key, raw, default);
                default
            }
        },
    };
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("SCRIBE_API_URL", " https://scribe.example.org "),
            ("SCRIBE_API_KEY", "secret"),
            ("SCRIBE_GENERATE_TIMEOUT_SECS", "90"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://scribe.example.org");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.generate_timeout, Duration::from_secs(90));
        assert_eq!(config.redact_timeout, Duration::from_secs(DEFAULT_REDACT_TIMEOUT_SECS));
    }

    #[test]
    fn test_bad_timeouts_fall_back() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("SCRIBE_TRANSCRIBE_TIMEOUT_SECS", "soon"),
            ("SCRIBE_REDACT_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.transcribe_timeout, Duration::from_secs(DEFAULT_TRANSCRIBE_TIMEOUT_SECS));
        assert_eq!(config.redact_timeout, Duration::from_secs(DEFAULT_REDACT_TIMEOUT_SECS));
    }

    #[test]
    fn test_bad_urls() {
        assert_eq!(
            ServiceConfig::from_lookup(lookup(&[("SCRIBE_API_URL", "  ")])),
            Err(ConfigError::EmptyBaseUrl)
        );
        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[("SCRIBE_API_URL", "ftp://x")])),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
        assert_eq!(
            ServiceConfig::from_lookup(lookup(&[("SCRIBE_API_KEY", "  ")])).unwrap().api_key,
            None
        );
    }
}
