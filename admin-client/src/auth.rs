// admin-client/src/auth.rs
use common::{credential_fingerprint, Identity};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::validation;

/// Message used when the service rejects a login without saying why
pub const AUTHENTICATION_FAILED: &str = "authentication failed";

/// Exchanges credentials for an identity and owns login/logout.
#[derive(Clone)]
pub struct AuthGateway {
    api: ApiClient,
}

impl AuthGateway {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Log in and persist the returned identity.
    ///
    /// Empty fields fail locally without a request. On any failure the
    /// session is left as it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, ClientError> {
        let request = validation::login(email, password)?;
        tracing::debug!("Submitting login");

        let identity: Identity = match self.api.post("/auth/login", &request).await {
            Ok(identity) => identity,
            Err(ClientError::Request(e)) if e.server_message().is_none() => {
                tracing::info!("Login rejected with status {}", e.status);
                return Err(ClientError::Request(e.with_message(AUTHENTICATION_FAILED)));
            }
            Err(e) => {
                tracing::info!("Login failed: {}", e);
                return Err(e);
            }
        };

        if !identity.is_complete() {
            tracing::warn!("Login response for user {} carried no credential", identity.id);
            return Err(ClientError::Decode("login response carried no credential".to_string()));
        }

        self.api.session().set(&identity)?;
        tracing::info!(
            "Logged in as user {} ({}), credential {}",
            identity.id,
            identity.role,
            credential_fingerprint(&identity.credential)
        );
        Ok(identity)
    }

    /// Forget the current identity. Never fails.
    pub fn logout(&self) {
        self.api.session().clear();
    }
}
