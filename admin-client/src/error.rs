// admin-client/src/error.rs
use std::fmt;
use thiserror::Error;

use crate::policy::Capability;
use crate::session::SessionError;
use crate::validation::ValidationErrors;

/// Failure of any client operation
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Local, field-level input problem. Never reaches the network.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The service answered with a non-2xx status
    #[error(transparent)]
    Request(RequestError),

    /// No response was obtained
    #[error("network error: {0}")]
    Network(String),

    /// The service answered 2xx but the body was not what we expected
    #[error("invalid response from service: {0}")]
    Decode(String),

    /// The path could not be joined onto the base URL
    #[error("invalid request path: {0}")]
    InvalidPath(String),

    /// The local access policy vetoed the action before any request was made
    #[error("role '{role}' is not permitted to {capability}")]
    AuthorizationDenied { role: String, capability: Capability },

    #[error(transparent)]
    Storage(#[from] SessionError),
}

impl ClientError {
    /// True for a 401/403 response.
    ///
    /// The API client never clears the session on its own; callers decide,
    /// and the views in this crate clear it when this returns true.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, ClientError::Request(e) if e.is_authorization_failure())
    }

    /// Only transport failures are worth offering a retry for
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// Errors that are handled inline and never pushed as notifications
    pub fn is_local(&self) -> bool {
        matches!(self, ClientError::Validation(_) | ClientError::AuthorizationDenied { .. })
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        ClientError::Validation(errors)
    }
}

impl From<RequestError> for ClientError {
    fn from(error: RequestError) -> Self {
        ClientError::Request(error)
    }
}

/// Non-2xx answer from the clinic service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub status: u16,
    server_message: Option<String>,
}

impl RequestError {
    pub fn new(status: u16, server_message: Option<String>) -> Self {
        Self { status, server_message }
    }

    /// The message the service supplied, if its body carried one
    pub fn server_message(&self) -> Option<&str> {
        self.server_message.as_deref()
    }

    /// Human-readable reason: the service's message, else a generic one
    pub fn message(&self) -> String {
        match &self.server_message {
            Some(message) => message.clone(),
            None => format!("request failed (status {})", self.status),
        }
    }

    /// Same status, message replaced
    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            status: self.status,
            server_message: Some(message.into()),
        }
    }

    pub fn is_authorization_failure(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for RequestError {}
