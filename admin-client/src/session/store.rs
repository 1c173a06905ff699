// admin-client/src/session/store.rs
use actix::prelude::*;
use chrono::Utc;
use common::{credential_fingerprint, is_credential_expired, Identity};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::storage::{KeyValueStorage, MemoryStorage};

/// Default storage key of the identity record
pub const DEFAULT_SESSION_KEY: &str = "clinic.identity";

/// Where a session change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// `set` or `clear` on this store
    Local,
    /// Another process rewrote the shared storage
    External,
}

/// Actor message: the current identity may have changed; re-query the store
#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct SessionChanged {
    pub origin: ChangeOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("failed to encode identity: {0}")]
    Encode(String),
    #[error("failed to persist identity: {0}")]
    Write(String),
}

struct Inner {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    subscribers: DashMap<SubscriptionId, Recipient<SessionChanged>>,
}

/// The single source of truth for who is logged in.
///
/// Cheap to clone; clones share storage and subscribers. Nothing is cached:
/// every `get` reads the backing storage, so a change made elsewhere is seen
/// on the next call.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_key(storage, DEFAULT_SESSION_KEY)
    }

    pub fn with_key(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                key: key.into(),
                subscribers: DashMap::new(),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// The stored identity.
    ///
    /// Missing, malformed, credential-less or expired records all read as
    /// logged out; this never fails.
    pub fn get(&self) -> Option<Identity> {
        let raw = self.raw()?;

        let identity: Identity = match serde_json::from_str(&raw) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!("Ignoring malformed stored identity: {}", e);
                return None;
            }
        };

        if !identity.is_complete() {
            tracing::warn!("Ignoring stored identity {} without credential", identity.id);
            return None;
        }

        if is_credential_expired(&identity.credential, Utc::now()) {
            tracing::info!(
                "Stored credential {} for user {} has expired",
                credential_fingerprint(&identity.credential),
                identity.id
            );
            return None;
        }

        Some(identity)
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }

    /// Persist `identity` as the current session and notify subscribers
    pub fn set(&self, identity: &Identity) -> Result<(), SessionError> {
        let json = serde_json::to_string(identity).map_err(|e| SessionError::Encode(e.to_string()))?;

        self.inner
            .storage
            .write(&self.inner.key, &json)
            .map_err(|e| SessionError::Write(e.to_string()))?;

        tracing::info!(
            "Session started for user {} ({}), credential {}",
            identity.id,
            identity.role,
            credential_fingerprint(&identity.credential)
        );
        self.notify(ChangeOrigin::Local);
        Ok(())
    }

    /// Forget the current session. Storage failures are logged, never raised.
    pub fn clear(&self) {
        if let Err(e) = self.inner.storage.remove(&self.inner.key) {
            tracing::error!("Failed to remove stored identity: {}", e);
        }
        tracing::info!("Session cleared");
        self.notify(ChangeOrigin::Local);
    }

    /// Register for [`SessionChanged`] signals
    pub fn subscribe(&self, recipient: Recipient<SessionChanged>) -> SubscriptionId {
        let id = SubscriptionId(Uuid::new_v4());
        self.inner.subscribers.insert(id, recipient);
        tracing::debug!("Session subscriber registered ({} total)", self.inner.subscribers.len());
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.subscribers.remove(&id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Signal that the storage was changed by someone else
    pub fn notify_external(&self) {
        self.notify(ChangeOrigin::External);
    }

    /// Raw stored record, used to detect changes made by other processes
    pub(crate) fn raw(&self) -> Option<String> {
        self.inner.storage.read(&self.inner.key)
    }

    fn notify(&self, origin: ChangeOrigin) {
        let mut closed = Vec::new();

        for entry in self.inner.subscribers.iter() {
            if entry.value().connected() {
                entry.value().do_send(SessionChanged { origin });
            } else {
                closed.push(*entry.key());
            }
        }

        // Drop subscribers whose actor has stopped
        for id in closed {
            self.inner.subscribers.remove(&id);
        }
    }
}
