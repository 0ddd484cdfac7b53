//! Normalized call results.
//!
//! Every call resolves to an [`ApiResult`]: a response summary plus the
//! parsed body. Transport faults and forced logouts are folded into the same
//! shape, with a human-readable `error` in the body, so callers never handle
//! raw errors.

use serde::Serialize;
use serde_json::{json, Value};

use crate::clients::errors::{InvalidHttpRequestError, TransportError};

/// Message returned when the session was cleared.
pub const SESSION_EXPIRED_MESSAGE: &str =
    "Sesión expirada, por favor inicia sesión nuevamente.";

/// Message returned when the server could not be reached.
pub const NETWORK_ERROR_MESSAGE: &str =
    "No se pudo conectar con el servidor. Revisa tu conexión e intenta de nuevo.";

/// Message returned when a request exceeded its deadline.
pub const TIMEOUT_MESSAGE: &str = "El servidor tardó demasiado en responder. Intenta de nuevo.";

/// Summary of the final response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// `true` for a 2xx status.
    pub ok: bool,
    /// HTTP status, or `0` if no response was received.
    pub status: u16,
    /// `true` if no response reached the client.
    pub network_error: bool,
}

/// Outcome of [`ApiClient::call`](crate::ApiClient::call).
///
/// # Example
///
/// ```rust
/// use raffle_client::ApiResult;
/// use serde_json::json;
///
/// let result = ApiResult::session_expired();
/// assert!(!result.res.ok);
/// assert_eq!(result.res.status, 401);
/// assert!(result.error_message().unwrap().starts_with("Sesión expirada"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiResult {
    /// Response summary.
    pub res: ApiResponse,
    /// Parsed body; `{}` when the body was empty or not JSON.
    pub data: Value,
}

impl ApiResult {
    /// Wraps a response that reached the client.
    #[must_use]
    pub fn from_response(status: u16, data: Value) -> Self {
        Self {
            res: ApiResponse {
                ok: (200..300).contains(&status),
                status,
                network_error: false,
            },
            data,
        }
    }

    /// Result for a request that never got a response.
    #[must_use]
    pub fn network_failure(error: &TransportError) -> Self {
        let message = if error.is_timeout() {
            TIMEOUT_MESSAGE
        } else {
            NETWORK_ERROR_MESSAGE
        };
        Self {
            res: ApiResponse {
                ok: false,
                status: 0,
                network_error: true,
            },
            data: json!({ "error": message }),
        }
    }

    /// Result for a request rejected before sending.
    #[must_use]
    pub fn invalid_request(error: &InvalidHttpRequestError) -> Self {
        Self {
            res: ApiResponse {
                ok: false,
                status: 0,
                network_error: false,
            },
            data: json!({ "error": error.to_string() }),
        }
    }

    /// Uniform result after a forced logout.
    #[must_use]
    pub fn session_expired() -> Self {
        Self {
            res: ApiResponse {
                ok: false,
                status: 401,
                network_error: false,
            },
            data: json!({ "error": SESSION_EXPIRED_MESSAGE }),
        }
    }

    /// Returns `true` for a 2xx response.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.res.ok
    }

    /// Returns the `error` or `message` field of the body, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.data
            .get("error")
            .and_then(Value::as_str)
            .or_else(|| self.data.get("message").and_then(Value::as_str))
    }
}

/// Parses a response body.
///
/// Empty and non-JSON bodies become an empty object.
#[must_use]
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({}))
}
