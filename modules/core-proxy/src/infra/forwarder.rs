//! `reqwest` implementation of the core service client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{Instrument, info_span, instrument};

use crate::domain::error::DomainError;
use crate::domain::model::{CoreResponse, ForwardedRequest};
use crate::domain::ports::CoreClient;

/// HTTP client forwarding gateway calls to the core service.
pub struct ReqwestCoreClient {
    client: reqwest::Client,
}

impl ReqwestCoreClient {
    /// Create a client with the given connect and total request timeouts.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created (TLS backend).
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .pool_max_idle_per_host(10)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

fn map_send_error(e: &reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::UpstreamTimeout
    } else if e.is_builder() {
        DomainError::request_build("request", e.to_string())
    } else if e.is_connect() {
        DomainError::upstream_unavailable(format!("connection error: {e}"))
    } else {
        DomainError::upstream_unavailable(format!("request error: {e}"))
    }
}

#[async_trait]
impl CoreClient for ReqwestCoreClient {
    #[instrument(skip(self, request), fields(method = %request.method, core_url = %request.url))]
    async fn send(&self, request: &ForwardedRequest) -> Result<CoreResponse, DomainError> {
        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .instrument(info_span!("http_request"))
            .await
            .map_err(|e| map_send_error(&e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| map_send_error(&e))?;

        tracing::debug!(status_code = status.as_u16(), body_len = body.len(), "Core answered");
        Ok(CoreResponse::new(status, headers, body))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
    use http::{HeaderMap, StatusCode};
    use httpmock::prelude::*;
    use serde_json::json;
    use url::Url;

    fn client(timeout_ms: u64) -> ReqwestCoreClient {
        ReqwestCoreClient::new(Duration::from_secs(1), Duration::from_millis(timeout_ms)).unwrap()
    }

    fn request(method: http::Method, url: &str, headers: HeaderMap, body: &'static str) -> ForwardedRequest {
        ForwardedRequest {
            method,
            url: Url::parse(url).unwrap(),
            headers,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[tokio::test]
    async fn forwards_method_headers_and_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(Method::POST)
                    .path("/api/v1/dialogues")
                    .query_param("page", "2")
                    .header("authorization", "Bearer abc")
                    .json_body(json!({ "title": "hello" }));
                then.status(201).json_body(json!({ "result": { "id": 7 } }));
            })
            .await;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let req = request(
            http::Method::POST,
            &server.url("/api/v1/dialogues?page=2"),
            headers,
            r#"{"title":"hello"}"#,
        );

        let resp = client(2_000).send(&req).await.unwrap();
        mock.assert_async().await;
        assert_eq!(resp.status, StatusCode::CREATED);
        let body: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
        assert_eq!(body["result"]["id"], 7);
    }

    #[tokio::test]
    async fn non_success_status_is_a_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(Method::GET).path("/bots");
                then.status(500).body("Internal Server Error");
            })
            .await;

        let req = request(http::Method::GET, &server.url("/bots"), HeaderMap::new(), "");
        let resp = client(2_000).send(&req).await.unwrap();
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.body, Bytes::from_static(b"Internal Server Error"));
    }

    #[tokio::test]
    async fn slow_core_is_a_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(Method::GET).path("/bots");
                then.status(200).delay(Duration::from_millis(500));
            })
            .await;

        let req = request(http::Method::GET, &server.url("/bots"), HeaderMap::new(), "");
        let err = client(50).send(&req).await.unwrap_err();
        assert!(matches!(err, DomainError::UpstreamTimeout));
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let req = request(
            http::Method::GET,
            "http://127.0.0.1:9/bots",
            HeaderMap::new(),
            "",
        );
        let err = client(2_000).send(&req).await.unwrap_err();
        assert!(matches!(err, DomainError::UpstreamUnavailable { .. }));
    }
}
