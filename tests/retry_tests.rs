//! Integration tests for the retry policy, deadlines and result shape.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use raffle_client::clients::{NETWORK_ERROR_MESSAGE, TIMEOUT_MESSAGE};
use raffle_client::telemetry::{ErrorContext, ErrorReporter, FailureKind};
use raffle_client::{
    ApiClient, BaseUrl, ClientConfig, ClientError, HttpMethod, HttpRequest, MemorySessionStore,
    MultipartPart, Session,
};
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Default)]
struct RecordingReporter {
    kinds: Mutex<Vec<FailureKind>>,
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, _error: &ClientError, context: &ErrorContext) {
        self.kinds.lock().unwrap().push(context.kind);
    }
}

/// Reporter whose backend is down.
#[derive(Debug, Default, Clone, Copy)]
struct PanickingReporter;

impl ErrorReporter for PanickingReporter {
    fn report(&self, _error: &ClientError, _context: &ErrorContext) {
        panic!("telemetry backend unavailable");
    }
}

fn create_client<R>(base_url: &str, timeout: Duration, reporter: Arc<R>) -> ApiClient
where
    R: ErrorReporter + 'static,
{
    let config = ClientConfig::builder()
        .base_url(BaseUrl::new(base_url).unwrap())
        .timeout(timeout)
        .retry_delays(vec![Duration::from_millis(10), Duration::from_millis(20)])
        .build()
        .unwrap();
    let sessions = Arc::new(MemorySessionStore::with_session(
        Session::new("access").with_refresh_token("refresh"),
    ));

    ApiClient::builder(config, sessions)
        .error_reporter(reporter)
        .build()
}

// ============================================================================
// Retry Policy
// ============================================================================

#[tokio::test]
async fn test_get_is_retried_twice_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raffles"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "busy"})))
        .expect(3)
        .mount(&server)
        .await;

    let reporter = Arc::new(RecordingReporter::default());
    let client = create_client(&server.uri(), Duration::from_secs(5), Arc::clone(&reporter));

    let result = client.get("/raffles").await;

    assert!(!result.is_ok());
    assert_eq!(result.res.status, 503);
    assert!(!result.res.network_error);
    assert_eq!(result.error_message(), Some("busy"));
    assert_eq!(*reporter.kinds.lock().unwrap(), vec![FailureKind::Server]);
}

#[tokio::test]
async fn test_get_recovers_after_transient_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raffles/3"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/raffles/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let reporter = Arc::new(RecordingReporter::default());
    let client = create_client(&server.uri(), Duration::from_secs(5), Arc::clone(&reporter));

    let result = client.get("/raffles/3").await;

    assert!(result.is_ok());
    assert_eq!(result.data, json!({"id": 3}));
    assert!(reporter.kinds.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_post_is_never_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/raffles/3/tickets"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(
        &server.uri(),
        Duration::from_secs(5),
        Arc::new(RecordingReporter::default()),
    );

    let result = client
        .post("/raffles/3/tickets", json!({"quantity": 2}))
        .await;

    assert_eq!(result.res.status, 500);
    assert_eq!(result.data, json!({}));
}

#[tokio::test]
async fn test_patch_and_delete_are_never_retried() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/tickets/5"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let reporter = Arc::new(RecordingReporter::default());
    let client = create_client(&server.uri(), Duration::from_secs(5), Arc::clone(&reporter));

    let patched = client.patch("/me", json!({"name": "Ana"})).await;
    assert_eq!(patched.res.status, 500);

    let deleted = client.delete("/tickets/5").await;
    assert_eq!(deleted.res.status, 500);

    assert_eq!(
        *reporter.kinds.lock().unwrap(),
        vec![FailureKind::Server, FailureKind::Server]
    );
}

#[tokio::test]
async fn test_head_is_retried_twice_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/raffles/3"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = create_client(
        &server.uri(),
        Duration::from_secs(5),
        Arc::new(RecordingReporter::default()),
    );

    let result = client.head("/raffles/3").await;

    assert_eq!(result.res.status, 500);
    assert!(!result.is_ok());
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raffles/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "No existe"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(
        &server.uri(),
        Duration::from_secs(5),
        Arc::new(RecordingReporter::default()),
    );

    let result = client.get("/raffles/404").await;

    assert_eq!(result.res.status, 404);
    assert_eq!(result.error_message(), Some("No existe"));
}

// ============================================================================
// Deadlines and Network Errors
// ============================================================================

#[tokio::test]
async fn test_get_timeout_is_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .expect(3)
        .mount(&server)
        .await;

    let reporter = Arc::new(RecordingReporter::default());
    let client = create_client(
        &server.uri(),
        Duration::from_millis(100),
        Arc::clone(&reporter),
    );

    let result = client.get("/slow").await;

    assert!(!result.res.ok);
    assert_eq!(result.res.status, 0);
    assert!(result.res.network_error);
    assert_eq!(result.error_message(), Some(TIMEOUT_MESSAGE));
    assert_eq!(*reporter.kinds.lock().unwrap(), vec![FailureKind::Timeout]);
}

#[tokio::test]
async fn test_post_timeout_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(
        &server.uri(),
        Duration::from_millis(100),
        Arc::new(RecordingReporter::default()),
    );

    let result = client.post("/slow", json!({})).await;

    assert!(result.res.network_error);
    assert_eq!(result.res.status, 0);
}

#[tokio::test]
async fn test_per_request_timeout_overrides_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/uploads"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(
        &server.uri(),
        Duration::from_millis(100),
        Arc::new(RecordingReporter::default()),
    );

    let request = HttpRequest::builder(HttpMethod::Post, "/uploads")
        .json(json!({"name": "receipt"}))
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let result = client.call(request).await;

    assert_eq!(result.res.status, 201);
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let reporter = Arc::new(RecordingReporter::default());
    let client = create_client(
        "http://127.0.0.1:1",
        Duration::from_secs(2),
        Arc::clone(&reporter),
    );

    let result = client.get("/raffles").await;

    assert!(result.res.network_error);
    assert_eq!(result.res.status, 0);
    assert_eq!(result.error_message(), Some(NETWORK_ERROR_MESSAGE));
    assert_eq!(*reporter.kinds.lock().unwrap(), vec![FailureKind::Network]);
}

#[tokio::test]
async fn test_panicking_reporter_does_not_escape_call() {
    let client = create_client(
        "http://127.0.0.1:1",
        Duration::from_secs(2),
        Arc::new(PanickingReporter),
    );

    let outcome = tokio::spawn(async move { client.get("/raffles").await }).await;

    let result = outcome.expect("call must not panic");
    assert!(!result.res.ok);
    assert!(result.res.network_error);
    assert_eq!(result.res.status, 0);
    assert_eq!(result.error_message(), Some(NETWORK_ERROR_MESSAGE));
}

#[tokio::test]
async fn test_panicking_reporter_keeps_server_error_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/raffles/3/tickets"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({"error": "upstream"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(
        &server.uri(),
        Duration::from_secs(5),
        Arc::new(PanickingReporter),
    );

    let result = client
        .post("/raffles/3/tickets", json!({"quantity": 1}))
        .await;

    assert_eq!(result.res.status, 502);
    assert_eq!(result.error_message(), Some("upstream"));
}

// ============================================================================
// Request Shape
// ============================================================================

#[tokio::test]
async fn test_request_carries_bearer_query_and_caller_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raffles"))
        .and(query_param("page", "2"))
        .and(header("Authorization", "Bearer access"))
        .and(header("Accept", "application/json"))
        .and(header("X-App-Version", "3.1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(
        &server.uri(),
        Duration::from_secs(5),
        Arc::new(RecordingReporter::default()),
    );

    let request = HttpRequest::builder(HttpMethod::Get, "/raffles")
        .query_param("page", "2")
        .header("X-App-Version", "3.1.0")
        .build()
        .unwrap();
    let result = client.call(request).await;

    assert!(result.is_ok());
    assert_eq!(result.data, json!([]));
}

#[tokio::test]
async fn test_json_body_is_sent_with_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/me"))
        .and(header("Content-Type", "application/json"))
        .and(body_string(r#"{"name":"Ana"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Ana"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(
        &server.uri(),
        Duration::from_secs(5),
        Arc::new(RecordingReporter::default()),
    );

    let result = client.patch("/me", json!({"name": "Ana"})).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_multipart_upload_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/raffles/3/receipt"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"uploaded": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(
        &server.uri(),
        Duration::from_secs(5),
        Arc::new(RecordingReporter::default()),
    );

    let request = HttpRequest::builder(HttpMethod::Post, "/raffles/3/receipt")
        .multipart(vec![
            MultipartPart::text("reference", "TX-991"),
            MultipartPart::file(
                "receipt",
                "receipt.png",
                vec![0x89, 0x50, 0x4e, 0x47],
                Some("image/png"),
            ),
        ])
        .build()
        .unwrap();
    let result = client.call(request).await;

    assert_eq!(result.res.status, 201);
    assert_eq!(result.data, json!({"uploaded": true}));
}

#[tokio::test]
async fn test_empty_and_non_json_bodies_become_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/tickets/5"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let client = create_client(
        &server.uri(),
        Duration::from_secs(5),
        Arc::new(RecordingReporter::default()),
    );

    let deleted = client.delete("/tickets/5").await;
    assert!(deleted.is_ok());
    assert_eq!(deleted.data, json!({}));

    let health = client.get("/health").await;
    assert!(health.is_ok());
    assert_eq!(health.data, json!({}));
}
