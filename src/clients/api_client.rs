//! The authenticated API client.
//!
//! [`ApiClient`] sends every request through the retry policy with the
//! current bearer credential attached, and handles authentication failures:
//!
//! - a 401 with a stale credential triggers one shared renewal, then a single
//!   replay of each waiting request
//! - a 401 or 403 that names an unrecoverable credential clears the session
//!   without attempting a renewal
//! - a failed renewal clears the session once and every waiter gets the same
//!   session-expired result
//!
//! Every call resolves to an [`ApiResult`]; nothing is thrown to the caller.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::auth::refresh::{renewed_session, RefreshRequest};
use crate::auth::token_error::{self, TokenErrorKind};
use crate::auth::{RefreshError, Session, SessionSink};
use crate::clients::errors::{ClientError, TransportError};
use crate::clients::http_request::{HttpMethod, HttpRequest, HttpRequestBuilder, RequestBody};
use crate::clients::http_response::ApiResult;
use crate::clients::refresh::{self as single_flight, RefreshCoordinator, RefreshOutcome, Ticket};
use crate::clients::retry::{send_with_retry, RetryPolicy};
use crate::clients::transport::{RawResponse, Transport};
use crate::config::ClientConfig;
use crate::telemetry::{ErrorContext, ErrorReporter, FailureKind, TracingReporter};

/// Library version from Cargo.toml.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Client for the raffle API.
///
/// Cloning is cheap and clones share the renewal slot, so a whole app can
/// hand one client to every screen.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use raffle_client::{ApiClient, BaseUrl, ClientConfig, MemorySessionStore, Session};
///
/// let config = ClientConfig::builder()
///     .base_url(BaseUrl::new("https://api.example.com").unwrap())
///     .build()
///     .unwrap();
/// let sessions = Arc::new(MemorySessionStore::with_session(
///     Session::new("access").with_refresh_token("refresh"),
/// ));
///
/// let client = ApiClient::new(config, sessions);
/// assert!(client.default_headers()["User-Agent"].contains("raffle-api-client"));
/// assert!(!client.is_refreshing());
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

// Verify ApiClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiClient>();
};

struct ClientInner {
    config: ClientConfig,
    transport: Transport,
    retry: RetryPolicy,
    default_headers: HashMap<String, String>,
    sessions: Arc<dyn SessionSink>,
    reporter: Arc<dyn ErrorReporter>,
    refresh: RefreshCoordinator,
}

/// What to do with a response that reached the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Done,
    Renew,
    ForceLogout(&'static str),
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.inner.config)
            .field("retry", &self.inner.retry)
            .field("refreshing", &self.inner.refresh.is_pending())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client that reports failures through [`TracingReporter`].
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This should
    /// only happen in extremely unusual circumstances (e.g., TLS initialization failure).
    #[must_use]
    pub fn new(config: ClientConfig, sessions: Arc<dyn SessionSink>) -> Self {
        Self::builder(config, sessions).build()
    }

    /// Starts building a client.
    #[must_use]
    pub fn builder(config: ClientConfig, sessions: Arc<dyn SessionSink>) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            sessions,
            reporter: None,
            http_client: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the headers sent with every request.
    #[must_use]
    pub fn default_headers(&self) -> &HashMap<String, String> {
        &self.inner.default_headers
    }

    /// Returns `true` while a token renewal is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_pending()
    }

    /// Sends `request` and resolves to its normalized result.
    ///
    /// Dropping the returned future cancels the request. A renewal it started
    /// keeps running so other waiters still get its outcome.
    pub async fn call(&self, request: HttpRequest) -> ApiResult {
        self.inner.run(request).await
    }

    /// Sends a GET request.
    pub async fn get(&self, path: &str) -> ApiResult {
        self.send(HttpRequest::builder(HttpMethod::Get, path)).await
    }

    /// Sends a HEAD request.
    pub async fn head(&self, path: &str) -> ApiResult {
        self.send(HttpRequest::builder(HttpMethod::Head, path)).await
    }

    /// Sends a POST request with `body`.
    pub async fn post(&self, path: &str, body: impl Into<RequestBody>) -> ApiResult {
        self.send(HttpRequest::builder(HttpMethod::Post, path).body(body))
            .await
    }

    /// Sends a PUT request with `body`.
    pub async fn put(&self, path: &str, body: impl Into<RequestBody>) -> ApiResult {
        self.send(HttpRequest::builder(HttpMethod::Put, path).body(body))
            .await
    }

    /// Sends a PATCH request with `body`.
    pub async fn patch(&self, path: &str, body: impl Into<RequestBody>) -> ApiResult {
        self.send(HttpRequest::builder(HttpMethod::Patch, path).body(body))
            .await
    }

    /// Sends a DELETE request.
    pub async fn delete(&self, path: &str) -> ApiResult {
        self.send(HttpRequest::builder(HttpMethod::Delete, path))
            .await
    }

    async fn send(&self, builder: HttpRequestBuilder) -> ApiResult {
        match builder.build() {
            Ok(request) => self.call(request).await,
            Err(error) => ApiResult::invalid_request(&error),
        }
    }
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config: ClientConfig,
    sessions: Arc<dyn SessionSink>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    http_client: Option<reqwest::Client>,
}

impl ApiClientBuilder {
    /// Sets the telemetry sink. Defaults to [`TracingReporter`].
    #[must_use]
    pub fn error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Uses a preconfigured reqwest client, e.g. with a proxy.
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the client.
    ///
    /// # Panics
    ///
    /// Panics if no reqwest client was supplied and the default one cannot be
    /// created (e.g., TLS initialization failure).
    #[must_use]
    pub fn build(self) -> ApiClient {
        let user_agent_prefix = self
            .config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent =
            format!("{user_agent_prefix}raffle-api-client v{CLIENT_VERSION} | Rust {rust_version}");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        let client = self.http_client.unwrap_or_else(|| {
            reqwest::Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to create HTTP client")
        });

        ApiClient {
            inner: Arc::new(ClientInner {
                transport: Transport::new(client, self.config.base_url().clone()),
                retry: RetryPolicy::from_config(&self.config),
                config: self.config,
                default_headers,
                sessions: self.sessions,
                reporter: self
                    .reporter
                    .unwrap_or_else(|| Arc::new(TracingReporter)),
                refresh: RefreshCoordinator::default(),
            }),
        }
    }
}

impl ClientInner {
    async fn run(self: &Arc<Self>, mut request: HttpRequest) -> ApiResult {
        if let Err(error) = request.verify() {
            return ApiResult::invalid_request(&error);
        }

        let mut session = self.sessions.current().filter(Session::is_active);

        loop {
            let response = match self.attempt(&request, session.as_ref()).await {
                Ok(response) => response,
                Err(error) => return self.network_failure(&request, error),
            };

            match verdict(&request, session.as_ref(), &response) {
                Verdict::Done => return self.finish(&request, response),
                Verdict::ForceLogout(reason) => return self.force_logout(&request, reason),
                Verdict::Renew => {
                    let Some(used) = session.take() else {
                        return self.finish(&request, response);
                    };
                    let Some(renewed) = self.renew(&used).await else {
                        return ApiResult::session_expired();
                    };
                    tracing::debug!(
                        "Replaying {} {} with renewed credentials",
                        request.http_method,
                        request.path
                    );
                    request = request.into_replay();
                    session = Some(renewed);
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &HttpRequest,
        session: Option<&Session>,
    ) -> Result<RawResponse, TransportError> {
        let headers = request.build_headers(&self.default_headers, session);
        let deadline = request.timeout.unwrap_or_else(|| self.config.timeout());
        send_with_retry(&self.transport, &self.retry, request, &headers, deadline).await
    }

    /// Returns a session to replay with, or `None` if the user was signed out.
    async fn renew(self: &Arc<Self>, used: &Session) -> Option<Session> {
        let current = self.sessions.current()?;

        // Someone else already renewed while this request was in flight.
        if current.is_active() && current.access_token != used.access_token {
            return Some(current);
        }

        let rx = match self.refresh.join() {
            Ticket::Leader(tx, rx) => {
                tracing::info!("Access token rejected, renewing session");
                let inner = Arc::clone(self);
                tokio::spawn(async move {
                    let outcome = inner.refresh_session(&current).await;
                    inner.refresh.complete(&tx, outcome);
                });
                rx
            }
            Ticket::Follower(rx) => rx,
        };

        match single_flight::wait(rx).await {
            RefreshOutcome::Renewed(session) => Some(session),
            RefreshOutcome::Failed => None,
        }
    }

    async fn refresh_session(&self, previous: &Session) -> RefreshOutcome {
        match self.request_renewal(previous).await {
            Ok(session) => {
                self.sessions.persist(&session, session.persist_options());
                tracing::info!("Session renewed");
                RefreshOutcome::Renewed(session)
            }
            Err(error) => {
                tracing::warn!("Session renewal failed, signing out: {}", error);
                self.sessions.clear();
                self.report(
                    ClientError::Refresh(error),
                    self.config.refresh_path(),
                    HttpMethod::Post,
                    FailureKind::RefreshFailed,
                );
                RefreshOutcome::Failed
            }
        }
    }

    async fn request_renewal(&self, previous: &Session) -> Result<Session, RefreshError> {
        let refresh_token = previous
            .refresh_token()
            .ok_or(RefreshError::MissingRefreshToken)?;

        let request = HttpRequest {
            http_method: HttpMethod::Post,
            path: self.config.refresh_path().to_string(),
            body: Some(RequestBody::Json(RefreshRequest { refresh_token }.to_json())),
            query: None,
            extra_headers: None,
            timeout: None,
            attempted_refresh: true,
        };
        let headers = request.build_headers(&self.default_headers, None);

        let response = send_with_retry(
            &self.transport,
            &self.retry,
            &request,
            &headers,
            self.config.timeout(),
        )
        .await?;

        renewed_session(previous, response.status, &response.body)
    }

    fn force_logout(&self, request: &HttpRequest, reason: &'static str) -> ApiResult {
        tracing::warn!(
            "{} {}: {}, signing out",
            request.http_method,
            request.path,
            reason
        );
        self.sessions.clear();
        self.report(
            ClientError::SessionExpired {
                reason: reason.to_string(),
            },
            &request.path,
            request.http_method,
            FailureKind::SessionExpired,
        );
        ApiResult::session_expired()
    }

    fn network_failure(&self, request: &HttpRequest, error: TransportError) -> ApiResult {
        let result = ApiResult::network_failure(&error);
        let kind = if error.is_timeout() {
            FailureKind::Timeout
        } else {
            FailureKind::Network
        };
        self.report(
            ClientError::Transport(error),
            &request.path,
            request.http_method,
            kind,
        );
        result
    }

    fn finish(&self, request: &HttpRequest, response: RawResponse) -> ApiResult {
        if response.status >= 500 {
            self.report(
                ClientError::Server {
                    status: response.status,
                },
                &request.path,
                request.http_method,
                FailureKind::Server,
            );
        }
        ApiResult::from_response(response.status, response.body)
    }

    /// Hands a failure to the reporter. A panicking reporter is contained here.
    fn report(&self, error: ClientError, path: &str, method: HttpMethod, kind: FailureKind) {
        let context = ErrorContext::new(path, method, kind);
        let reported = panic::catch_unwind(AssertUnwindSafe(|| {
            self.reporter.report(&error, &context);
        }));
        if reported.is_err() {
            tracing::warn!(
                "Error reporter panicked while reporting {} failure for {} {}",
                kind,
                method,
                path
            );
        }
    }
}

/// Classifies a response to a request sent with `session`.
///
/// Only requests that carried a bearer credential are subject to renewal or
/// forced logout.
fn verdict(request: &HttpRequest, session: Option<&Session>, response: &RawResponse) -> Verdict {
    let Some(session) = session else {
        return Verdict::Done;
    };

    match token_error::classify(response.status, &response.body) {
        TokenErrorKind::Terminal => Verdict::ForceLogout("credential rejected as unrecoverable"),
        TokenErrorKind::Stale if response.status == 401 => {
            if request.attempted_refresh {
                Verdict::ForceLogout("credential rejected after renewal")
            } else if session.can_refresh() {
                Verdict::Renew
            } else {
                Verdict::Done
            }
        }
        _ => Verdict::Done,
    }
}
