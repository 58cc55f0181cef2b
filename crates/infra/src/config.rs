//! Backend connection settings, read from the environment.

use std::time::Duration;

use thiserror::Error;

pub const API_URL_VAR: &str = "PADRON_API_URL";
pub const ACCESS_TOKEN_VAR: &str = "PADRON_ACCESS_TOKEN";
pub const TIMEOUT_VAR: &str = "PADRON_API_TIMEOUT_SECS";

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be an http(s) URL, got {value:?}")]
    InvalidUrl { var: &'static str, value: String },

    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },

    #[error("could not build HTTP client: {0}")]
    Client(String),
}

/// Where the reference catalogs live and how to call them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            access_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Unset or blank variables take their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_url = read(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                var: API_URL_VAR,
                value: base_url,
            });
        }

        let timeout = match read(TIMEOUT_VAR) {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        var: TIMEOUT_VAR,
                        value: raw,
                    });
                }
            },
        };

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: read(ACCESS_TOKEN_VAR),
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        assert_eq!(config(&[]).unwrap(), ApiConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let c = config(&[
            (API_URL_VAR, "https://padron.example.org/api/"),
            (ACCESS_TOKEN_VAR, "abc"),
            (TIMEOUT_VAR, "4"),
        ])
        .unwrap();

        assert_eq!(c.base_url, "https://padron.example.org/api");
        assert_eq!(c.access_token.as_deref(), Some("abc"));
        assert_eq!(c.timeout, Duration::from_secs(4));
    }

    #[test]
    fn blank_token_means_no_token() {
        assert_eq!(config(&[(ACCESS_TOKEN_VAR, "  ")]).unwrap().access_token, None);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            config(&[(API_URL_VAR, "localhost:3000")]),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            config(&[(TIMEOUT_VAR, "0")]),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        assert!(matches!(
            config(&[(TIMEOUT_VAR, "soon")]),
            Err(ConfigError::InvalidTimeout { .. })
        ));
    }
}
