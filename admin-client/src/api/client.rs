// admin-client/src/api/client.rs
use common::{credential_fingerprint, Config};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::transport::{OutgoingRequest, RawResponse, ReqwestTransport, Transport};
use crate::error::{ClientError, RequestError};
use crate::session::SessionStore;

/// Per-call options
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Overrides the client's default timeout for this call
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            timeout: None,
        }
    }
}

impl RequestOptions {
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Client for the clinic service.
///
/// Attaches the stored credential to every call and normalizes failures
/// into [`ClientError`]. Each call is sent at most once; retry policy, and
/// what to do with the session after a 401/403, belong to the caller.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    session: SessionStore,
    default_timeout: Option<Duration>,
}

impl ApiClient {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>, session: SessionStore) -> Result<Self, url::ParseError> {
        // Validate once so every joined URL parses
        Url::parse(base_url)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            session,
            default_timeout: None,
        })
    }

    /// Client using the reqwest transport and the configured base URL and timeout
    pub fn from_config(config: &Config, session: SessionStore) -> Result<Self, url::ParseError> {
        let client = Self::new(&config.api_base_url, Arc::new(ReqwestTransport::new()), session)?;
        Ok(client.with_default_timeout(config.request_timeout()))
    }

    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(path, RequestOptions::default()).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        let body = serde_json::to_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        self.request(path, RequestOptions::post(body)).await
    }

    /// Send one request and interpret the answer
    pub async fn request<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T, ClientError> {
        let url = self.url_for(path)?;

        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if options.body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        // Unauthenticated calls go out as-is; the service rejects them
        if let Some(identity) = self.session.get() {
            tracing::debug!("{} {} as credential {}", options.method, path, credential_fingerprint(&identity.credential));
            headers.push(("Authorization".to_string(), format!("Bearer {}", identity.credential)));
        } else {
            tracing::debug!("{} {} without credential", options.method, path);
        }

        let request = OutgoingRequest {
            method: options.method,
            url,
            headers,
            body: options.body,
        };

        let response = match options.timeout.or(self.default_timeout) {
            Some(limit) => match tokio::time::timeout(limit, self.transport.send(request)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("Request to {} timed out after {:?}", path, limit);
                    return Err(ClientError::Network(format!("request timed out after {:?}", limit)));
                }
            },
            None => self.transport.send(request).await,
        };

        let response = response.map_err(|e| {
            tracing::warn!("No response from {}: {}", path, e);
            ClientError::Network(e.0)
        })?;

        interpret(response)
    }

    fn url_for(&self, path: &str) -> Result<Url, ClientError> {
        join_url(&self.base_url, path)
    }
}

/// `base` and `path` joined with exactly one slash
fn join_url(base: &str, path: &str) -> Result<Url, ClientError> {
    let joined = if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    };
    Url::parse(&joined).map_err(|e| ClientError::InvalidPath(format!("{}: {}", joined, e)))
}

/// Map a raw answer onto the error contract
pub fn interpret<T: DeserializeOwned>(response: RawResponse) -> Result<T, ClientError> {
    if !(200..300).contains(&response.status) {
        let message = server_message(&response.body);
        tracing::debug!("Service answered {}: {:?}", response.status, message);
        return Err(ClientError::Request(RequestError::new(response.status, message)));
    }

    let body = if response.body.trim().is_empty() { "null" } else { response.body.as_str() };
    serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
}

/// The `message` (or `error`) string of a JSON error body
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .filter(|message| !message.trim().is_empty())
        .map(str::to_string)
}
