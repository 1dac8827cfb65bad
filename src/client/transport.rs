//! HTTP transport for document submissions.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::TransportError;

/// Header carrying the document signature.
pub const SIGNATURE_HEADER: &str = "Signature";

const APPLICATION_JSON: &str = "application/json";
const USER_AGENT: &str = concat!("crpt-client/", env!("CARGO_PKG_VERSION"));

/// Status line and body of a completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Performs the outbound call for an admitted submission.
///
/// Implementations must be safe to call from many tasks at once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `endpoint`, signed with `signature`.
    async fn post(
        &self,
        endpoint: &Url,
        body: Vec<u8>,
        signature: &str,
    ) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, timeout })
    }

    /// Wrap an existing client. `timeout` is only used for error reporting.
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        endpoint: &Url,
        body: Vec<u8>,
        signature: &str,
    ) -> Result<TransportResponse, TransportError> {
        debug!(endpoint = %endpoint, bytes = body.len(), "Sending document");

        let response = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint(server: &MockServer) -> Url {
        Url::parse(&format!("{}/api/v3/lk/documents/create", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_post_sends_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/lk/documents/create"))
            .and(header("Content-Type", "application/json"))
            .and(header("Signature", "sig-123"))
            .and(body_json(serde_json::json!({"doc_id": "1"})))
            .respond_with(ResponseTemplate::new(201).set_body_string("created"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport
            .post(&endpoint(&server), br#"{"doc_id":"1"}"#.to_vec(), "sig-123")
            .await
            .unwrap();

        assert_eq!(
            response,
            TransportResponse {
                status: 201,
                body: "created".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_error_status_is_still_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bad signature"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport
            .post(&endpoint(&server), b"{}".to_vec(), "sig")
            .await
            .unwrap();

        assert_eq!(response.status, 403);
        assert_eq!(response.body, "bad signature");
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_millis(100)).unwrap();
        let err = transport
            .post(&endpoint(&server), b"{}".to_vec(), "sig")
            .await
            .unwrap_err();

        assert_eq!(err, TransportError::Timeout(Duration::from_millis(100)));
    }
}
