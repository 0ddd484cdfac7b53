//! Classification of 401/403 responses.
//!
//! A stale access token can be renewed; an invalid, revoked or otherwise
//! rejected one cannot, and the session must be dropped. Servers that follow
//! the current contract put a machine-readable `code` in the error body:
//!
//! | `code`             | kind                      |
//! |--------------------|---------------------------|
//! | `token_expired`    | [`TokenErrorKind::Stale`] |
//! | `token_invalid`    | [`TokenErrorKind::Terminal`] |
//! | `token_malformed`  | [`TokenErrorKind::Terminal`] |
//! | `token_revoked`    | [`TokenErrorKind::Terminal`] |
//! | `session_expired`  | [`TokenErrorKind::Terminal`] |
//!
//! Older deployments only send a human-readable `error` or `message`; for
//! those, [`message_indicates_terminal`] applies a text heuristic. It is the
//! only place that inspects message text, so it can be replaced without
//! touching the request flow.

use serde_json::Value;

/// What an authentication failure means for the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenErrorKind {
    /// The access token is out of date; a renewal may fix it.
    Stale,
    /// The credentials are unusable; the session must be cleared.
    Terminal,
    /// Not a token problem (e.g. a 403 for missing permissions).
    Unrelated,
}

impl TokenErrorKind {
    /// Parses the `code` field of the error contract.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "token_expired" => Some(Self::Stale),
            "token_invalid" | "token_malformed" | "token_revoked" | "session_expired" => {
                Some(Self::Terminal)
            }
            _ => None,
        }
    }
}

/// Classifies a response by status and parsed body.
///
/// Only 401 and 403 are considered. A tagged `code` wins over the message
/// heuristic. A 401 that matches neither is treated as stale, a 403 as
/// unrelated.
#[must_use]
pub fn classify(status: u16, body: &Value) -> TokenErrorKind {
    if status != 401 && status != 403 {
        return TokenErrorKind::Unrelated;
    }

    if let Some(kind) = body
        .get("code")
        .and_then(Value::as_str)
        .and_then(TokenErrorKind::from_code)
    {
        return kind;
    }

    if error_text(body).is_some_and(message_indicates_terminal) {
        return TokenErrorKind::Terminal;
    }

    if status == 401 {
        TokenErrorKind::Stale
    } else {
        TokenErrorKind::Unrelated
    }
}

/// Legacy heuristic over the server's error text.
///
/// Matches a token described as invalid, malformed or revoked, or an explicit
/// "session expired", in Spanish or English. A plain "token expired" is not
/// terminal: that is the stale case the renewal exists for.
#[must_use]
pub fn message_indicates_terminal(message: &str) -> bool {
    const REJECTED: [&str; 7] = [
        "inválido",
        "invalido",
        "invalid",
        "malformed",
        "mal formado",
        "revocado",
        "revoked",
    ];
    const SESSION_GONE: [&str; 3] = ["sesión expirada", "sesion expirada", "session expired"];

    let lower = message.to_lowercase();
    let mentions_token = lower.contains("token") || lower.contains("jwt");

    (mentions_token && REJECTED.iter().any(|word| lower.contains(word)))
        || SESSION_GONE.iter().any(|phrase| lower.contains(phrase))
}

fn error_text(body: &Value) -> Option<&str> {
    body.get("error")
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
}
