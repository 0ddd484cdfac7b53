//! Error types of the client layer.
//!
//! - [`TransportError`]: no response reached the client
//! - [`InvalidHttpRequestError`]: a request failed validation before sending
//! - [`ClientError`]: a classified failure, as handed to the
//!   [`ErrorReporter`](crate::telemetry::ErrorReporter)
//!
//! None of these escape [`ApiClient::call`](crate::ApiClient::call); it
//! converts every failure into an [`ApiResult`](crate::ApiResult).

use std::time::Duration;

use thiserror::Error;

use crate::auth::RefreshError;

/// A failure before any response was read.
///
/// The retry policy only retries [`TransportError::Timeout`]; any other
/// transport failure ends the request immediately.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The deadline elapsed and the in-flight call was cancelled.
    #[error("Request timed out after {}ms", after.as_millis())]
    Timeout {
        /// The deadline that elapsed.
        after: Duration,
    },

    /// DNS, connect, TLS or body read failure.
    #[error("Network error: {message}")]
    Network {
        /// Description from the HTTP stack.
        message: String,
    },
}

impl TransportError {
    /// Returns `true` for a deadline expiry or cancellation.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Classifies a reqwest error.
    pub(crate) fn from_reqwest(error: &reqwest::Error, deadline: Duration) -> Self {
        if error.is_timeout() {
            Self::Timeout { after: deadline }
        } else {
            Self::Network {
                message: error.to_string(),
            }
        }
    }
}

/// Error returned when a request fails validation.
///
/// # Example
///
/// ```rust
/// use raffle_client::InvalidHttpRequestError;
///
/// let error = InvalidHttpRequestError::BodyNotAllowed {
///     method: "GET".to_string(),
/// };
/// assert_eq!(error.to_string(), "Cannot send a body with GET.");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// GET and HEAD requests cannot carry a body.
    #[error("Cannot send a body with {method}.")]
    BodyNotAllowed {
        /// The HTTP method used.
        method: String,
    },

    /// The request path is empty.
    #[error("Request path cannot be empty.")]
    EmptyPath,
}

/// A classified failure reported to telemetry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No response reached the client.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a 5xx status after any retries.
    #[error("Server error with status {status}")]
    Server {
        /// The final HTTP status code.
        status: u16,
    },

    /// The session was cleared after an unrecoverable authentication failure.
    #[error("Session expired: {reason}")]
    SessionExpired {
        /// Why the session was dropped.
        reason: String,
    },

    /// The renewal call failed.
    #[error(transparent)]
    Refresh(#[from] RefreshError),
}
