//! HTTP layer of the raffle API client.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ApiClient`]: the authenticated client every screen talks to
//! - [`HttpRequest`]: a request to be sent to the API
//! - [`ApiResult`]: the normalized outcome of a call
//! - [`HttpMethod`]: supported HTTP methods
//! - [`RequestBody`]: JSON, text, binary or multipart payloads
//! - [`RetryPolicy`]: retry budget and backoff schedule
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use raffle_client::{ApiClient, ClientConfig, HttpMethod, HttpRequest, MemorySessionStore};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(ClientConfig::from_env()?, Arc::new(MemorySessionStore::new()));
//!
//! let request = HttpRequest::builder(HttpMethod::Post, "/raffles/42/tickets")
//!     .json(json!({"quantity": 2}))
//!     .build()?;
//!
//! let result = client.call(request).await;
//! if !result.is_ok() {
//!     eprintln!("{}", result.error_message().unwrap_or("request failed"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Retry Behavior
//!
//! - **GET/HEAD**: up to 2 retries on a 5xx status or a timeout, after 350 ms
//!   then 900 ms
//! - **POST/PUT/PATCH/DELETE**: never retried
//! - **4xx and connection errors**: returned immediately
//!
//! Each attempt has its own deadline (15 s by default).

mod api_client;
mod errors;
mod http_request;
mod http_response;
mod refresh;
mod retry;
mod transport;

pub use api_client::{ApiClient, ApiClientBuilder, CLIENT_VERSION};
pub use errors::{ClientError, InvalidHttpRequestError, TransportError};
pub use http_request::{
    HttpMethod, HttpRequest, HttpRequestBuilder, MultipartPart, PartValue, RequestBody,
};
pub use http_response::{
    parse_body, ApiResponse, ApiResult, NETWORK_ERROR_MESSAGE, SESSION_EXPIRED_MESSAGE,
    TIMEOUT_MESSAGE,
};
pub use refresh::RefreshOutcome;
pub use retry::RetryPolicy;
