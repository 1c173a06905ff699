// admin-client/src/testing.rs
//! Test doubles shared by the unit tests.
use actix::prelude::*;
use async_trait::async_trait;
use common::Identity;
use dashmap::DashMap;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{ApiClient, OutgoingRequest, RawResponse, Transport, TransportError};
use crate::notification::{Notification, NotificationChanged};
use crate::session::{ChangeOrigin, SessionChanged, SessionStore};

/// One request seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone)]
struct Scripted {
    outcome: Result<RawResponse, String>,
    delay: Option<Duration>,
}

/// Scripted transport keyed by method and path suffix.
///
/// Unscripted routes answer 404 `{"message":"not found"}`.
#[derive(Default)]
pub struct MockTransport {
    routes: DashMap<(Method, String), Scripted>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.script(method, path, Ok(raw(status, &body)), None);
    }

    pub fn respond_after(&self, method: Method, path: &str, status: u16, body: Value, delay: Duration) {
        self.script(method, path, Ok(raw(status, &body)), Some(delay));
    }

    /// Answer with a body that is not JSON
    pub fn respond_text(&self, method: Method, path: &str, status: u16, body: &str) {
        let response = RawResponse {
            status,
            body: body.to_string(),
        };
        self.script(method, path, Ok(response), None);
    }

    pub fn fail(&self, method: Method, path: &str, reason: &str) {
        self.script(method, path, Err(reason.to_string()), None);
    }

    pub fn fail_after(&self, method: Method, path: &str, reason: &str, delay: Duration) {
        self.script(method, path, Err(reason.to_string()), Some(delay));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn script(&self, method: Method, path: &str, outcome: Result<RawResponse, String>, delay: Option<Duration>) {
        self.routes.insert((method, path.to_string()), Scripted { outcome, delay });
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<Scripted> {
        self.routes
            .iter()
            .filter(|entry| entry.key().0 == *method && path.ends_with(entry.key().1.as_str()))
            .max_by_key(|entry| entry.key().1.len())
            .map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError> {
        let path = request.url.path().to_string();
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method.clone(),
            path: path.clone(),
            authorization: request.header("Authorization").map(str::to_string),
            body: request.body.clone(),
        });

        let Some(scripted) = self.lookup(&request.method, &path) else {
            return Ok(raw(404, &json!({ "message": "not found" })));
        };
        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        scripted.outcome.map_err(TransportError)
    }
}

fn raw(status: u16, body: &Value) -> RawResponse {
    RawResponse {
        status,
        body: body.to_string(),
    }
}

pub fn identity(role: &str) -> Identity {
    Identity::new(1, format!("Test {role}"), role, format!("token-{role}"))
}

/// In-memory session holding an identity with `role`
pub fn session_as(role: &str) -> SessionStore {
    let session = SessionStore::in_memory();
    session.set(&identity(role)).unwrap();
    session
}

pub fn api_with(transport: &Arc<MockTransport>, session: &SessionStore) -> ApiClient {
    ApiClient::new("http://clinic.test/api", transport.clone(), session.clone()).unwrap()
}

/// Collects session change signals
#[derive(Default)]
pub struct SignalRecorder {
    seen: Vec<ChangeOrigin>,
}

impl Actor for SignalRecorder {
    type Context = Context<Self>;
}

impl Handler<SessionChanged> for SignalRecorder {
    type Result = ();

    fn handle(&mut self, msg: SessionChanged, _ctx: &mut Self::Context) {
        self.seen.push(msg.origin);
    }
}

/// Drain the signals collected so far
#[derive(Message)]
#[rtype(result = "Vec<ChangeOrigin>")]
pub struct TakeSignals;

impl Handler<TakeSignals> for SignalRecorder {
    type Result = MessageResult<TakeSignals>;

    fn handle(&mut self, _msg: TakeSignals, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(std::mem::take(&mut self.seen))
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct StopRecorder;

impl Handler<StopRecorder> for SignalRecorder {
    type Result = ();

    fn handle(&mut self, _msg: StopRecorder, ctx: &mut Self::Context) {
        ctx.stop();
    }
}

/// Collects notification changes
#[derive(Default)]
pub struct NotificationRecorder {
    seen: Vec<Option<Notification>>,
}

impl Actor for NotificationRecorder {
    type Context = Context<Self>;
}

impl Handler<NotificationChanged> for NotificationRecorder {
    type Result = ();

    fn handle(&mut self, msg: NotificationChanged, _ctx: &mut Self::Context) {
        self.seen.push(msg.current);
    }
}

#[derive(Message)]
#[rtype(result = "Vec<Option<Notification>>")]
pub struct TakeNotifications;

impl Handler<TakeNotifications> for NotificationRecorder {
    type Result = MessageResult<TakeNotifications>;

    fn handle(&mut self, _msg: TakeNotifications, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(std::mem::take(&mut self.seen))
    }
}
