//! Wire contract of the renewal endpoint.
//!
//! ```text
//! POST /auth/refresh
//! {"refreshToken": "..."}
//!
//! 200 OK
//! {"accessToken": "...", "refreshToken": "...", "user": {...}}
//! ```
//!
//! Only `accessToken` is required. A missing `refreshToken` or `user` keeps
//! the previous value. A success status without a non-empty `accessToken` is
//! still a failure.

use serde::Deserialize;
use serde_json::{json, Value};

use super::error::RefreshError;
use super::session::Session;

/// Request body posted to the renewal endpoint.
#[derive(Debug, Clone, Copy)]
pub struct RefreshRequest<'a> {
    /// The refresh credential of the current session.
    pub refresh_token: &'a str,
}

impl RefreshRequest<'_> {
    /// Returns the JSON body.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({ "refreshToken": self.refresh_token })
    }
}

/// Response body of the renewal endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// New bearer credential.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Rotated refresh credential, if the server issued one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Updated user profile, if included.
    #[serde(default)]
    pub user: Option<Value>,
}

/// Builds the renewed session from a renewal response.
///
/// # Errors
///
/// - [`RefreshError::Rejected`] for a non-2xx status
/// - [`RefreshError::MissingAccessToken`] for a 2xx status whose body has no
///   non-empty `accessToken`
pub fn renewed_session(
    previous: &Session,
    status: u16,
    body: &Value,
) -> Result<Session, RefreshError> {
    if !(200..300).contains(&status) {
        let message = body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(RefreshError::Rejected { status, message });
    }

    let response: RefreshResponse = if body.is_object() {
        serde_json::from_value(body.clone()).unwrap_or_default()
    } else {
        RefreshResponse::default()
    };

    let access_token = response
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or(RefreshError::MissingAccessToken { status })?;

    Ok(Session {
        access_token,
        refresh_token: response
            .refresh_token
            .filter(|token| !token.is_empty())
            .or_else(|| previous.refresh_token.clone()),
        user: response.user.or_else(|| previous.user.clone()),
        remember: previous.remember,
    })
}
