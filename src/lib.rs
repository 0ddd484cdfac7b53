//! # Raffle API Client
//!
//! A resilient, authenticated HTTP client for the raffle ticketing API.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - A per-request deadline (15 s by default) that cancels the connection
//! - Bounded retries for GET and HEAD only, with a fixed 350 ms / 900 ms backoff
//! - Single-flight token renewal shared by every request that hits a 401
//! - Forced logout when the server says a credential can never work again
//! - A uniform [`ApiResult`] for every call: no call ever returns an error
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use raffle_client::{ApiClient, BaseUrl, ClientConfig, MemorySessionStore, Session};
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let sessions = Arc::new(MemorySessionStore::with_session(
//!     Session::new("access-token").with_refresh_token("refresh-token"),
//! ));
//!
//! let client = ApiClient::new(config, sessions);
//! ```
//!
//! ## Making Calls
//!
//! ```rust,ignore
//! let result = client.get("/raffles?status=active").await;
//!
//! if result.res.network_error {
//!     // offline or timed out
//! } else if result.is_ok() {
//!     println!("{}", result.data);
//! } else {
//!     println!("{}", result.error_message().unwrap_or("error"));
//! }
//! ```
//!
//! ## Session Handling
//!
//! The client never stores credentials itself. It reads the current
//! [`Session`] from a [`SessionSink`], persists renewed credentials to it,
//! and clears it when the session cannot be recovered. A cleared session
//! yields a 401 result whose `error` is [`SESSION_EXPIRED_MESSAGE`].
//!
//! ## Telemetry
//!
//! Timeouts, network failures, 5xx responses, forced logouts and failed
//! renewals are reported to an [`telemetry::ErrorReporter`]. The default
//! [`telemetry::TracingReporter`] emits `tracing` events; install any
//! subscriber to collect them.

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export public types at crate root for convenience
pub use auth::{MemorySessionStore, PersistOptions, RefreshError, Session, SessionSink};
pub use config::{BaseUrl, ClientConfig, ClientConfigBuilder};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    ApiClient, ApiClientBuilder, ApiResponse, ApiResult, ClientError, HttpMethod, HttpRequest,
    HttpRequestBuilder, InvalidHttpRequestError, MultipartPart, RequestBody, RetryPolicy,
    TransportError, SESSION_EXPIRED_MESSAGE,
};
