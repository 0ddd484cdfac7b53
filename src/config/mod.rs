//! Client configuration.
//!
//! - [`ClientConfig`]: immutable settings shared by every request
//! - [`ClientConfigBuilder`]: builder for [`ClientConfig`]
//! - [`BaseUrl`]: validated backend base URL
//!
//! Base URL and timeout are resolved once, either through the builder or
//! from the environment with [`ClientConfig::from_env`], and never re-derived
//! per call.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use raffle_client::{BaseUrl, ClientConfig};
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://api.rifas.example").unwrap())
//!     .timeout(Duration::from_secs(10))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.refresh_path(), "/auth/refresh");
//! ```

mod newtypes;

pub use newtypes::BaseUrl;

use std::time::Duration;

use crate::error::ConfigError;

/// Default per-attempt deadline in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Default renewal endpoint path.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// Default number of automatic retries for idempotent methods.
pub const DEFAULT_IDEMPOTENT_RETRIES: u32 = 2;

/// Default wait before each retry, indexed by retry number.
pub const DEFAULT_RETRY_DELAYS_MS: [u64; 2] = [350, 900];

/// Environment variable holding the backend base URL.
pub const ENV_BASE_URL: &str = "API_BASE_URL";

/// Environment variable overriding the request timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "API_TIMEOUT_MS";

/// Configuration for an [`ApiClient`](crate::ApiClient).
///
/// `ClientConfig` is `Clone + Send + Sync`.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: BaseUrl,
    timeout: Duration,
    refresh_path: String,
    idempotent_retries: u32,
    retry_delays: Vec<Duration>,
    user_agent_prefix: Option<String>,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Builds a configuration from `API_BASE_URL` and the optional
    /// `API_TIMEOUT_MS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `API_BASE_URL` is not
    /// set, [`ConfigError::InvalidBaseUrl`] if it is malformed, and
    /// [`ConfigError::InvalidEnvVar`] if the timeout is not an integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = lookup(ENV_BASE_URL).ok_or(ConfigError::MissingRequiredField {
            field: ENV_BASE_URL,
        })?;
        let mut builder = ClientConfigBuilder::new().base_url(BaseUrl::new(base_url)?);

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: ENV_TIMEOUT_MS,
                value: raw.clone(),
            })?;
            builder = builder.timeout(Duration::from_millis(millis));
        }

        builder.build()
    }

    /// Returns the backend base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the per-attempt deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the renewal endpoint path.
    #[must_use]
    pub fn refresh_path(&self) -> &str {
        &self.refresh_path
    }

    /// Returns the retry budget for idempotent methods.
    #[must_use]
    pub const fn idempotent_retries(&self) -> u32 {
        self.idempotent_retries
    }

    /// Returns the backoff schedule.
    #[must_use]
    pub fn retry_delays(&self) -> &[Duration] {
        &self.retry_delays
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for [`ClientConfig`].
///
/// # Defaults
///
/// - `timeout`: 15 000 ms
/// - `refresh_path`: `/auth/refresh`
/// - `idempotent_retries`: 2
/// - `retry_delays`: 350 ms, then 900 ms
/// - `user_agent_prefix`: `None`
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<BaseUrl>,
    timeout: Option<Duration>,
    refresh_path: Option<String>,
    idempotent_retries: Option<u32>,
    retry_delays: Option<Vec<Duration>>,
    user_agent_prefix: Option<String>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend base URL (required).
    #[must_use]
    pub fn base_url(mut self, url: BaseUrl) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the per-attempt deadline.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the renewal endpoint path.
    #[must_use]
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = Some(path.into());
        self
    }

    /// Sets how many times GET and HEAD requests are retried.
    #[must_use]
    pub const fn idempotent_retries(mut self, retries: u32) -> Self {
        self.idempotent_retries = Some(retries);
        self
    }

    /// Sets the backoff schedule.
    ///
    /// Entry `n` is the wait before retry `n + 1`; the last entry is reused
    /// if there are more retries than entries.
    #[must_use]
    pub fn retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = Some(delays);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `base_url` is not set,
    /// [`ConfigError::ZeroTimeout`] for a zero timeout and
    /// [`ConfigError::InvalidRefreshPath`] if the refresh path is not absolute.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let base_url = self
            .base_url
            .ok_or(ConfigError::MissingRequiredField { field: "base_url" })?;

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS));
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let refresh_path = self
            .refresh_path
            .unwrap_or_else(|| DEFAULT_REFRESH_PATH.to_string());
        if !refresh_path.starts_with('/') {
            return Err(ConfigError::InvalidRefreshPath { path: refresh_path });
        }

        Ok(ClientConfig {
            base_url,
            timeout,
            refresh_path,
            idempotent_retries: self
                .idempotent_retries
                .unwrap_or(DEFAULT_IDEMPOTENT_RETRIES),
            retry_delays: self.retry_delays.unwrap_or_else(|| {
                DEFAULT_RETRY_DELAYS_MS
                    .iter()
                    .map(|ms| Duration::from_millis(*ms))
                    .collect()
            }),
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}
