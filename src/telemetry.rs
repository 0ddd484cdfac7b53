//! Error telemetry sink.
//!
//! The client reports every classified failure to an [`ErrorReporter`]
//! together with the request path, method and failure kind. Reporting is
//! best-effort: the trait returns nothing, and the client contains a panic
//! raised by a reporter, so a reporter cannot change the result a caller sees.
//!
//! [`TracingReporter`] is the default and emits one `tracing` error event per
//! failure.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::clients::{ClientError, HttpMethod};

/// Category of a reported failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The deadline elapsed.
    Timeout,
    /// No response for any other reason.
    Network,
    /// A 5xx status survived the retry policy.
    Server,
    /// The session was cleared.
    SessionExpired,
    /// The renewal call failed.
    RefreshFailed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Server => "server",
            Self::SessionExpired => "session_expired",
            Self::RefreshFailed => "refresh_failed",
        })
    }
}

/// Where and when a failure happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorContext {
    /// Request path.
    pub path: String,
    /// Request method.
    pub method: HttpMethod,
    /// Failure category.
    pub kind: FailureKind,
    /// When the failure was classified.
    pub occurred_at: DateTime<Utc>,
}

impl ErrorContext {
    /// Creates a context stamped with the current time.
    #[must_use]
    pub fn new(path: impl Into<String>, method: HttpMethod, kind: FailureKind) -> Self {
        Self {
            path: path.into(),
            method,
            kind,
            occurred_at: Utc::now(),
        }
    }
}

/// Receives classified failures.
pub trait ErrorReporter: Send + Sync {
    /// Records one failure.
    fn report(&self, error: &ClientError, context: &ErrorContext);
}

/// Reports failures as `tracing` error events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &ClientError, context: &ErrorContext) {
        tracing::error!(
            path = %context.path,
            method = %context.method,
            kind = %context.kind,
            "{}",
            error
        );
    }
}

/// Discards all reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopReporter;

impl ErrorReporter for NoopReporter {
    fn report(&self, _error: &ClientError, _context: &ErrorContext) {}
}
