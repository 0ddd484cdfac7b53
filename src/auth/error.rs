//! Token renewal error types.

use thiserror::Error;

use crate::clients::TransportError;

/// Errors that end a renewal attempt.
///
/// Every variant leads to the same outcome for waiting requests: the session
/// is cleared and they resolve as session-expired.
///
/// # Example
///
/// ```rust
/// use raffle_client::auth::RefreshError;
///
/// let error = RefreshError::MissingAccessToken { status: 200 };
/// assert!(error.to_string().contains("accessToken"));
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The session has no refresh token to post.
    #[error("No refresh token available")]
    MissingRefreshToken,

    /// The renewal endpoint answered with a non-success status.
    #[error("Token refresh rejected with status {status}: {message}")]
    Rejected {
        /// The HTTP status code returned.
        status: u16,
        /// The error text from the response body, if any.
        message: String,
    },

    /// A success status whose body lacks a usable `accessToken`.
    #[error("Token refresh returned status {status} without an accessToken")]
    MissingAccessToken {
        /// The HTTP status code returned.
        status: u16,
    },

    /// The renewal request never produced a response.
    #[error("Token refresh failed: {0}")]
    Transport(#[from] TransportError),
}
