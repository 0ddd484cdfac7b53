//! Bounded retries around the transport.
//!
//! - GET and HEAD get up to `idempotent_retries` extra attempts (default 2)
//! - every other method gets none, so a purchase is never sent twice
//! - a 5xx status or a timeout on an idempotent request is retried after the
//!   next entry of the fixed backoff schedule (default 350 ms, then 900 ms)
//! - any other transport error ends the request immediately
//!
//! When retries run out, the last response or error is the outcome.

use std::collections::HashMap;
use std::time::Duration;

use crate::clients::errors::TransportError;
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::transport::{RawResponse, Transport};
use crate::config::ClientConfig;

/// Retry budget and backoff schedule.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use raffle_client::{HttpMethod, RetryPolicy};
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_retries(HttpMethod::Get), 2);
/// assert_eq!(policy.max_retries(HttpMethod::Post), 0);
/// assert_eq!(policy.retry_on_status(HttpMethod::Get, 503, 0), Some(Duration::from_millis(350)));
/// assert_eq!(policy.retry_on_status(HttpMethod::Get, 503, 1), Some(Duration::from_millis(900)));
/// assert_eq!(policy.retry_on_status(HttpMethod::Get, 503, 2), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    idempotent_retries: u32,
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_IDEMPOTENT_RETRIES,
            crate::config::DEFAULT_RETRY_DELAYS_MS
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
        )
    }
}

impl RetryPolicy {
    /// Creates a policy with the given budget and schedule.
    #[must_use]
    pub const fn new(idempotent_retries: u32, delays: Vec<Duration>) -> Self {
        Self {
            idempotent_retries,
            delays,
        }
    }

    /// Creates the policy described by `config`.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.idempotent_retries(), config.retry_delays().to_vec())
    }

    /// Returns how many retries `method` may use.
    #[must_use]
    pub const fn max_retries(&self, method: HttpMethod) -> u32 {
        if method.is_idempotent() {
            self.idempotent_retries
        } else {
            0
        }
    }

    /// Returns the wait before the retry following `retries_done` retries.
    ///
    /// The last entry of the schedule is reused past its end; an empty
    /// schedule retries immediately.
    #[must_use]
    pub fn delay(&self, retries_done: u32) -> Duration {
        let index = usize::try_from(retries_done).unwrap_or(usize::MAX);
        self.delays
            .get(index)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Decides whether a response with `status` is retried.
    #[must_use]
    pub fn retry_on_status(
        &self,
        method: HttpMethod,
        status: u16,
        retries_done: u32,
    ) -> Option<Duration> {
        (status >= 500 && retries_done < self.max_retries(method))
            .then(|| self.delay(retries_done))
    }

    /// Decides whether a transport error is retried.
    #[must_use]
    pub fn retry_on_error(
        &self,
        method: HttpMethod,
        error: &TransportError,
        retries_done: u32,
    ) -> Option<Duration> {
        (error.is_timeout() && retries_done < self.max_retries(method))
            .then(|| self.delay(retries_done))
    }
}

/// Sends `request`, retrying as `policy` allows.
pub(crate) async fn send_with_retry(
    transport: &Transport,
    policy: &RetryPolicy,
    request: &HttpRequest,
    headers: &HashMap<String, String>,
    deadline: Duration,
) -> Result<RawResponse, TransportError> {
    let method = request.http_method;
    let mut retries_done: u32 = 0;

    loop {
        let outcome = transport.send(request, headers, deadline).await;

        let wait = match &outcome {
            Ok(response) => policy.retry_on_status(method, response.status, retries_done),
            Err(error) => policy.retry_on_error(method, error, retries_done),
        };

        let Some(wait) = wait else {
            return outcome;
        };

        retries_done += 1;
        match &outcome {
            Ok(response) => tracing::warn!(
                "{} {} returned {}, retry {}/{} in {}ms",
                method,
                request.path,
                response.status,
                retries_done,
                policy.max_retries(method),
                wait.as_millis()
            ),
            Err(error) => tracing::warn!(
                "{} {} failed ({}), retry {}/{} in {}ms",
                method,
                request.path,
                error,
                retries_done,
                policy.max_retries(method),
                wait.as_millis()
            ),
        }
        tokio::time::sleep(wait).await;
    }
}
