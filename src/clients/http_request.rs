//! Request descriptors and header assembly.
//!
//! This module provides [`HttpRequest`] and its builder, plus the header
//! assembly every attempt goes through:
//!
//! - `application/json` is always among the accepted types; a caller's
//!   `Accept` header is extended, never replaced
//! - `Authorization: Bearer <access>` is attached when a session is active
//! - `Content-Type: application/json` is inferred for JSON and text bodies
//!   unless the caller supplied a content type; binary and multipart bodies
//!   are never given a JSON content type

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::auth::Session;
use crate::clients::errors::InvalidHttpRequestError;

/// HTTP methods supported by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET.
    Get,
    /// HTTP HEAD.
    Head,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP PATCH.
    Patch,
    /// HTTP DELETE.
    Delete,
}

impl HttpMethod {
    /// Returns `true` for methods that are safe to repeat (GET and HEAD).
    #[must_use]
    pub const fn is_idempotent(self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }

    /// Returns `true` if requests with this method may carry a body.
    #[must_use]
    pub const fn allows_body(self) -> bool {
        !self.is_idempotent()
    }

    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Head => reqwest::Method::HEAD,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        })
    }
}

/// One field of a multipart form.
///
/// Parts are plain data so a form can be rebuilt for every attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartPart {
    /// Form field name.
    pub name: String,
    /// Field contents.
    pub value: PartValue,
}

/// Contents of a [`MultipartPart`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartValue {
    /// A plain text field.
    Text(String),
    /// A file upload.
    File {
        /// File name sent in the part's content disposition.
        file_name: String,
        /// Raw file contents.
        data: Vec<u8>,
        /// MIME type, e.g. `image/jpeg`.
        mime: Option<String>,
    },
}

impl MultipartPart {
    /// Creates a text field.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }

    /// Creates a file field.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        data: Vec<u8>,
        mime: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            value: PartValue::File {
                file_name: file_name.into(),
                data,
                mime: mime.map(String::from),
            },
        }
    }
}

/// Body of a request.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    /// A JSON value, serialized on send.
    Json(serde_json::Value),
    /// Pre-serialized text, sent as JSON unless a content type is supplied.
    Text(String),
    /// Raw bytes. Never given an inferred content type.
    Bytes {
        /// The payload.
        data: Vec<u8>,
        /// Content type to send when the caller set none.
        content_type: Option<String>,
    },
    /// A multipart form. The transport sets the boundary content type.
    Multipart(Vec<MultipartPart>),
}

impl RequestBody {
    /// Returns `true` if this body is sent as JSON by default.
    #[must_use]
    pub const fn is_json_like(&self) -> bool {
        matches!(self, Self::Json(_) | Self::Text(_))
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RequestBody {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A request to be sent to the backend.
///
/// Use [`HttpRequest::builder`] to construct requests.
///
/// # Example
///
/// ```rust
/// use raffle_client::{HttpMethod, HttpRequest};
/// use serde_json::json;
///
/// let purchase = HttpRequest::builder(HttpMethod::Post, "/raffles/12/tickets")
///     .json(json!({"numbers": [4, 8, 15]}))
///     .build()
///     .unwrap();
///
/// assert!(!purchase.http_method.is_idempotent());
/// assert!(!purchase.attempted_refresh);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    /// The HTTP method for this request.
    pub http_method: HttpMethod,
    /// Path appended to the base URL.
    pub path: String,
    /// The request body, if any.
    pub body: Option<RequestBody>,
    /// Query parameters to append to the URL.
    pub query: Option<HashMap<String, String>>,
    /// Caller-supplied headers.
    pub extra_headers: Option<HashMap<String, String>>,
    /// Per-attempt deadline overriding the configured default.
    pub timeout: Option<Duration>,
    /// Set once this request has been through a renewal cycle. A 401 on a
    /// request with this flag never starts another renewal.
    pub attempted_refresh: bool,
}

impl HttpRequest {
    /// Creates a new builder for constructing an `HttpRequest`.
    #[must_use]
    pub fn builder(method: HttpMethod, path: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, path)
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if:
    /// - `path` is empty
    /// - a body is attached to a GET or HEAD request
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        if self.path.trim().is_empty() {
            return Err(InvalidHttpRequestError::EmptyPath);
        }

        if self.body.is_some() && !self.http_method.allows_body() {
            return Err(InvalidHttpRequestError::BodyNotAllowed {
                method: self.http_method.to_string(),
            });
        }

        Ok(())
    }

    /// Returns a copy marked as having been through a renewal cycle.
    #[must_use]
    pub fn into_replay(mut self) -> Self {
        self.attempted_refresh = true;
        self
    }

    /// Assembles the headers for one attempt.
    ///
    /// `defaults` are applied first, then caller headers, then the bearer
    /// credential, then the inferred content type.
    #[must_use]
    pub fn build_headers(
        &self,
        defaults: &HashMap<String, String>,
        session: Option<&Session>,
    ) -> HashMap<String, String> {
        let mut headers = defaults.clone();

        if let Some(extra) = &self.extra_headers {
            for (key, value) in extra {
                remove_header(&mut headers, key);
                headers.insert(key.clone(), value.clone());
            }
        }

        accept_json(&mut headers);

        if let Some(session) = session.filter(|s| s.is_active()) {
            remove_header(&mut headers, "Authorization");
            headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", session.access_token),
            );
        }

        if !has_header(&headers, "Content-Type") {
            match &self.body {
                Some(body) if body.is_json_like() => {
                    headers.insert("Content-Type".to_string(), "application/json".to_string());
                }
                Some(RequestBody::Bytes {
                    content_type: Some(content_type),
                    ..
                }) => {
                    headers.insert("Content-Type".to_string(), content_type.clone());
                }
                _ => {}
            }
        }

        headers
    }
}

/// Makes sure `application/json` is among the accepted media types.
fn accept_json(headers: &mut HashMap<String, String>) {
    let accept = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("Accept"))
        .map(|(_, value)| value.clone());

    let value = match accept {
        Some(value) if value.to_ascii_lowercase().contains("application/json") => return,
        Some(value) if !value.trim().is_empty() => format!("{value}, application/json"),
        _ => "application/json".to_string(),
    };
    remove_header(headers, "Accept");
    headers.insert("Accept".to_string(), value);
}

fn has_header(headers: &HashMap<String, String>, name: &str) -> bool {
    headers.keys().any(|key| key.eq_ignore_ascii_case(name))
}

fn remove_header(headers: &mut HashMap<String, String>, name: &str) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
}

/// Builder for [`HttpRequest`].
#[derive(Debug)]
pub struct HttpRequestBuilder {
    http_method: HttpMethod,
    path: String,
    body: Option<RequestBody>,
    query: Option<HashMap<String, String>>,
    extra_headers: Option<HashMap<String, String>>,
    timeout: Option<Duration>,
    attempted_refresh: bool,
}

impl HttpRequestBuilder {
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            http_method: method,
            path: path.into(),
            body: None,
            query: None,
            extra_headers: None,
            timeout: None,
            attempted_refresh: false,
        }
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json(self, value: serde_json::Value) -> Self {
        self.body(RequestBody::Json(value))
    }

    /// Sets a raw binary body.
    #[must_use]
    pub fn bytes(self, data: Vec<u8>, content_type: Option<&str>) -> Self {
        self.body(RequestBody::Bytes {
            data,
            content_type: content_type.map(String::from),
        })
    }

    /// Sets a multipart form body.
    #[must_use]
    pub fn multipart(self, parts: Vec<MultipartPart>) -> Self {
        self.body(RequestBody::Multipart(parts))
    }

    /// Adds a single query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Sets all extra headers at once.
    #[must_use]
    pub fn extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Adds a single extra header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Overrides the per-attempt deadline for this request.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Marks the request as already refreshed, disabling renewal on 401.
    #[must_use]
    pub const fn attempted_refresh(mut self, attempted: bool) -> Self {
        self.attempted_refresh = attempted;
        self
    }

    /// Builds the [`HttpRequest`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if the request fails validation.
    pub fn build(self) -> Result<HttpRequest, InvalidHttpRequestError> {
        let request = HttpRequest {
            http_method: self.http_method,
            path: self.path,
            body: self.body,
            query: self.query,
            extra_headers: self.extra_headers,
            timeout: self.timeout,
            attempted_refresh: self.attempted_refresh,
        };
        request.verify()?;
        Ok(request)
    }
}
