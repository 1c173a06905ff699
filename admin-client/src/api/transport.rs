// admin-client/src/api/transport.rs
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use url::Url;

/// One outgoing HTTP request, already resolved against the base URL
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    /// JSON body for mutating requests
    pub body: Option<Value>,
}

impl OutgoingRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Whatever the service answered, before interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// No response was obtained
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Request/response exchange with the clinic service
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError>;
}

/// HTTP transport backed by reqwest
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| TransportError(e.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|e| TransportError(e.to_string()))?;
            headers.insert(name, value);
        }

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| TransportError(e.to_string()))?;

        Ok(RawResponse { status, body })
    }
}
