//! Session credentials consumed by the client.
//!
//! A [`Session`] is created by login or registration outside this crate and
//! read on every request. The client replaces it after a successful renewal
//! and asks the [`SessionSink`](crate::auth::SessionSink) to clear it when
//! the credentials are no longer usable.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Access and refresh credentials plus the signed-in user.
///
/// Tokens are opaque strings. The `Debug` output masks both of them.
///
/// # Example
///
/// ```rust
/// use raffle_client::Session;
///
/// let session = Session::new("access-token")
///     .with_refresh_token("refresh-token")
///     .with_user(serde_json::json!({"id": 7, "name": "Ana"}));
///
/// assert!(session.is_active());
/// assert!(session.can_refresh());
/// assert!(!format!("{session:?}").contains("access-token"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Bearer credential sent on every request.
    pub access_token: String,

    /// Credential posted to the renewal endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// User profile returned by the backend, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,

    /// Whether the UI asked to keep the session across restarts.
    #[serde(default)]
    pub remember: bool,
}

impl Session {
    /// Creates a session holding only an access token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            user: None,
            remember: false,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the user profile.
    #[must_use]
    pub fn with_user(mut self, user: serde_json::Value) -> Self {
        self.user = Some(user);
        self
    }

    /// Sets the remember flag.
    #[must_use]
    pub const fn with_remember(mut self, remember: bool) -> Self {
        self.remember = remember;
        self
    }

    /// Returns `true` if there is an access token to attach.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Returns the refresh token when it is present and non-empty.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Returns `true` if a renewal can be attempted.
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token().is_some()
    }

    /// Returns the persistence options matching this session.
    #[must_use]
    pub const fn persist_options(&self) -> PersistOptions {
        PersistOptions {
            remember: self.remember,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"*****")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "*****"))
            .field("user", &self.user)
            .field("remember", &self.remember)
            .finish()
    }
}

/// Options passed alongside a session when it is persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PersistOptions {
    /// Keep the session in durable storage rather than memory only.
    pub remember: bool,
}

// Verify Session is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};
