//! Configuration error types.
//!
//! All configuration constructors return `Result<T, ConfigError>` so an
//! invalid base URL or timeout is rejected before the first request is sent.
//!
//! # Example
//!
//! ```rust
//! use raffle_client::{BaseUrl, ConfigError};
//!
//! let result = BaseUrl::new("not a url");
//! assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur while building a [`ClientConfig`](crate::ClientConfig).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL is missing a scheme or host.
    #[error("Invalid base URL '{url}'. Expected an absolute URL such as 'https://api.example.com'.")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// A zero timeout would cancel every request immediately.
    #[error("Request timeout must be greater than zero.")]
    ZeroTimeout,

    /// Refresh path must be an absolute path on the base URL.
    #[error("Invalid refresh path '{path}'. Expected a path starting with '/'.")]
    InvalidRefreshPath {
        /// The invalid path that was provided.
        path: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// An environment variable is set but cannot be parsed.
    #[error("Invalid value '{value}' for environment variable {name}.")]
    InvalidEnvVar {
        /// The variable name.
        name: &'static str,
        /// The raw value that failed to parse.
        value: String,
    },
}
