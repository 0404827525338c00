//! Client configuration.
//!
//! All settings are plain values passed to the client at construction.
//! `ClientConfig::from_env` layers environment overrides on top of the
//! defaults for binaries that want them.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::Error;
use crate::retry::RetryConfig;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

pub const ENV_BASE_URL: &str = "ACCOUNTS_API_BASE_URL";
pub const ENV_MAX_ATTEMPTS: &str = "ACCOUNTS_API_MAX_ATTEMPTS";
pub const ENV_TIMEOUT_SECS: &str = "ACCOUNTS_API_TIMEOUT_SECS";

/// Connection pool and timeout settings for the default transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Connect plus read timeout for a single request.
    pub timeout: Duration,
    pub max_idle_connections: usize,
    pub max_idle_connections_per_host: usize,
    /// Idle pooled connections are closed after this long.
    pub idle_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_idle_connections: 50,
            max_idle_connections_per_host: 20,
            idle_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub retry: RetryConfig,
    pub transport: TransportConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Defaults overridden by `ACCOUNTS_API_BASE_URL`,
    /// `ACCOUNTS_API_MAX_ATTEMPTS` and `ACCOUNTS_API_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup(ENV_MAX_ATTEMPTS) {
            let attempts = parse_var::<u32>(ENV_MAX_ATTEMPTS, &raw)?;
            config.retry = config.retry.with_max_attempts(attempts);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.transport.timeout = Duration::from_secs(parse_var(ENV_TIMEOUT_SECS, &raw)?);
        }
        config.validate()?;
        Ok(config)
    }

    /// Check the base URL is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), Error> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::Validation(format!("base URL {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Validation(format!(
                "base URL {:?}: unsupported scheme {:?}",
                self.base_url,
                url.scheme()
            )));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Validation(format!("{key}={raw:?}: {e}")))
}
