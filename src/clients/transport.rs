//! A single HTTP exchange bounded by a deadline.
//!
//! The whole exchange (send plus body read) runs under
//! [`tokio::time::timeout`]. When the deadline elapses the exchange future is
//! dropped, which cancels the in-flight call and releases its connection.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::clients::errors::TransportError;
use crate::clients::http_request::{HttpRequest, MultipartPart, PartValue, RequestBody};
use crate::clients::http_response::parse_body;
use crate::config::BaseUrl;

/// A response that reached the client.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub(crate) struct Transport {
    client: reqwest::Client,
    base_url: BaseUrl,
}

impl Transport {
    pub(crate) const fn new(client: reqwest::Client, base_url: BaseUrl) -> Self {
        Self { client, base_url }
    }

    /// Sends one attempt of `request` with the given headers.
    ///
    /// # Errors
    ///
    /// [`TransportError::Timeout`] if `deadline` elapses first,
    /// [`TransportError::Network`] for any other failure to get a response.
    pub(crate) async fn send(
        &self,
        request: &HttpRequest,
        headers: &HashMap<String, String>,
        deadline: Duration,
    ) -> Result<RawResponse, TransportError> {
        let url = self.base_url.join(&request.path);

        let mut builder = self.client.request(request.http_method.as_reqwest(), &url);
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        if let Some(query) = &request.query {
            builder = builder.query(query);
        }
        builder = match &request.body {
            None => builder,
            Some(RequestBody::Json(value)) => builder.body(value.to_string()),
            Some(RequestBody::Text(text)) => builder.body(text.clone()),
            Some(RequestBody::Bytes { data, .. }) => builder.body(data.clone()),
            Some(RequestBody::Multipart(parts)) => builder.multipart(build_form(parts)),
        };

        let exchange = async {
            let response = builder
                .send()
                .await
                .map_err(|e| TransportError::from_reqwest(&e, deadline))?;
            let status = response.status().as_u16();
            let text = response
                .text()
                .await
                .map_err(|e| TransportError::from_reqwest(&e, deadline))?;
            Ok(RawResponse {
                status,
                body: parse_body(&text),
            })
        };

        if let Ok(result) = tokio::time::timeout(deadline, exchange).await {
            result
        } else {
            tracing::debug!(
                "{} {} cancelled after {}ms",
                request.http_method,
                request.path,
                deadline.as_millis()
            );
            Err(TransportError::Timeout { after: deadline })
        }
    }
}

fn build_form(parts: &[MultipartPart]) -> Form {
    parts.iter().fold(Form::new(), |form, part| match &part.value {
        PartValue::Text(text) => form.text(part.name.clone(), text.clone()),
        PartValue::File {
            file_name,
            data,
            mime,
        } => {
            let file = || Part::bytes(data.clone()).file_name(file_name.clone());
            let file_part = match mime {
                Some(mime) => file().mime_str(mime).unwrap_or_else(|e| {
                    tracing::warn!("Ignoring invalid MIME type '{}' for {}: {}", mime, file_name, e);
                    file()
                }),
                None => file(),
            };
            form.part(part.name.clone(), file_part)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::http_request::HttpMethod;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport_for(server: &MockServer) -> Transport {
        Transport::new(reqwest::Client::new(), BaseUrl::new(server.uri()).unwrap())
    }

    #[tokio::test]
    async fn test_send_returns_status_and_parsed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/raffles"))
            .and(query_param("page", "2"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let request = HttpRequest::builder(HttpMethod::Get, "/raffles")
            .query_param("page", "2")
            .build()
            .unwrap();
        let headers = request.build_headers(&HashMap::new(), None);

        let response = transport_for(&server)
            .send(&request, &headers, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn test_send_posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/raffles/4/tickets"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({"numbers": [7]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let request = HttpRequest::builder(HttpMethod::Post, "/raffles/4/tickets")
            .json(json!({"numbers": [7]}))
            .build()
            .unwrap();
        let headers = request.build_headers(&HashMap::new(), None);

        let response = transport_for(&server)
            .send(&request, &headers, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_non_json_body_becomes_empty_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let request = HttpRequest::builder(HttpMethod::Get, "/me").build().unwrap();
        let response = transport_for(&server)
            .send(&request, &HashMap::new(), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(response.status, 502);
        assert_eq!(response.body, json!({}));
    }

    #[tokio::test]
    async fn test_deadline_cancels_slow_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let request = HttpRequest::builder(HttpMethod::Get, "/slow").build().unwrap();
        let result = transport_for(&server)
            .send(&request, &HashMap::new(), Duration::from_millis(50))
            .await;

        assert_eq!(
            result,
            Err(TransportError::Timeout {
                after: Duration::from_millis(50)
            })
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let transport = Transport::new(
            reqwest::Client::new(),
            BaseUrl::new("http://127.0.0.1:1").unwrap(),
        );
        let request = HttpRequest::builder(HttpMethod::Get, "/me").build().unwrap();
        let result = transport
            .send(&request, &HashMap::new(), Duration::from_secs(5))
            .await;

        assert!(matches!(result, Err(TransportError::Network { .. })));
    }

    #[test]
    fn test_build_form_accepts_invalid_mime() {
        let parts = vec![
            MultipartPart::text("raffleId", "3"),
            MultipartPart::file("receipt", "r.bin", vec![1, 2], Some("not a mime")),
        ];
        let form = build_form(&parts);
        assert!(!form.boundary().is_empty());
    }
}
