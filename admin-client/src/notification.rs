// admin-client/src/notification.rs
use actix::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Default display time of a notification
pub const DEFAULT_TTL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Success => f.write_str("success"),
            NotificationKind::Error => f.write_str("error"),
        }
    }
}

/// Transient user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
}

// Messages for the notification center

/// Show a notification, replacing whatever is showing
#[derive(Message)]
#[rtype(result = "Uuid")]
pub struct Notify {
    pub message: String,
    pub kind: NotificationKind,
}

/// Hide the notification with `id`, or the current one when `None`
#[derive(Message)]
#[rtype(result = "()")]
pub struct Dismiss {
    pub id: Option<Uuid>,
}

#[derive(Message)]
#[rtype(result = "Option<Notification>")]
pub struct CurrentNotification;

#[derive(Message)]
#[rtype(result = "()")]
pub struct SubscribeNotifications(pub Recipient<NotificationChanged>);

/// Sent to subscribers whenever the visible notification changes
#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct NotificationChanged {
    pub current: Option<Notification>,
}

/// Process-wide notification slot of depth one.
///
/// A new notification replaces the current one and restarts the timer; each
/// notification dismisses itself after `ttl`.
pub struct NotificationCenter {
    ttl: Duration,
    current: Option<Notification>,
    expiry: Option<SpawnHandle>,
    subscribers: Vec<Recipient<NotificationChanged>>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            current: None,
            expiry: None,
            subscribers: Vec::new(),
        }
    }

    fn cancel_expiry(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.expiry.take() {
            ctx.cancel_future(handle);
        }
    }

    fn broadcast(&mut self) {
        let change = NotificationChanged {
            current: self.current.clone(),
        };
        self.subscribers.retain(|subscriber| subscriber.connected());
        for subscriber in &self.subscribers {
            subscriber.do_send(change.clone());
        }
    }

    fn expire(&mut self, id: Uuid) {
        // Only the notification this timer was started for
        if self.current.as_ref().map(|n| n.id) == Some(id) {
            tracing::debug!("Notification {} expired", id);
            self.current = None;
            self.expiry = None;
            self.broadcast();
        }
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl Actor for NotificationCenter {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!("Notification center started, ttl {:?}", self.ttl);
    }
}

impl Handler<Notify> for NotificationCenter {
    type Result = MessageResult<Notify>;

    fn handle(&mut self, msg: Notify, ctx: &mut Self::Context) -> Self::Result {
        self.cancel_expiry(ctx);

        let notification = Notification {
            id: Uuid::new_v4(),
            message: msg.message,
            kind: msg.kind,
        };
        let id = notification.id;
        match notification.kind {
            NotificationKind::Success => tracing::info!("Notification: {}", notification.message),
            NotificationKind::Error => tracing::warn!("Notification: {}", notification.message),
        }

        if let Some(replaced) = self.current.replace(notification) {
            tracing::debug!("Notification {} replaced by {}", replaced.id, id);
        }
        self.expiry = Some(ctx.run_later(self.ttl, move |act, _ctx| act.expire(id)));
        self.broadcast();

        MessageResult(id)
    }
}

impl Handler<Dismiss> for NotificationCenter {
    type Result = ();

    fn handle(&mut self, msg: Dismiss, ctx: &mut Self::Context) -> Self::Result {
        let matches = match (&self.current, msg.id) {
            (Some(current), Some(id)) => current.id == id,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if matches {
            self.cancel_expiry(ctx);
            self.current = None;
            self.broadcast();
        }
    }
}

impl Handler<CurrentNotification> for NotificationCenter {
    type Result = MessageResult<CurrentNotification>;

    fn handle(&mut self, _msg: CurrentNotification, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.current.clone())
    }
}

impl Handler<SubscribeNotifications> for NotificationCenter {
    type Result = ();

    fn handle(&mut self, msg: SubscribeNotifications, _ctx: &mut Self::Context) -> Self::Result {
        self.subscribers.push(msg.0);
    }
}

/// Cloneable handle passed to whoever needs to notify
#[derive(Clone)]
pub struct NotificationHandle {
    addr: Addr<NotificationCenter>,
}

impl NotificationHandle {
    /// Start a notification center on the current arbiter
    pub fn start(ttl: Duration) -> Self {
        Self {
            addr: NotificationCenter::new(ttl).start(),
        }
    }

    pub fn from_addr(addr: Addr<NotificationCenter>) -> Self {
        Self { addr }
    }

    pub fn addr(&self) -> &Addr<NotificationCenter> {
        &self.addr
    }

    /// Fire and forget
    pub fn success(&self, message: impl Into<String>) {
        self.push(message.into(), NotificationKind::Success);
    }

    /// Fire and forget
    pub fn error(&self, message: impl Into<String>) {
        self.push(message.into(), NotificationKind::Error);
    }

    pub async fn notify(&self, message: impl Into<String>, kind: NotificationKind) -> Result<Uuid, MailboxError> {
        self.addr
            .send(Notify {
                message: message.into(),
                kind,
            })
            .await
    }

    pub fn dismiss(&self, id: Option<Uuid>) {
        self.addr.do_send(Dismiss { id });
    }

    pub async fn current(&self) -> Option<Notification> {
        self.addr.send(CurrentNotification).await.ok().flatten()
    }

    pub fn subscribe(&self, recipient: Recipient<NotificationChanged>) {
        self.addr.do_send(SubscribeNotifications(recipient));
    }

    fn push(&self, message: String, kind: NotificationKind) {
        self.addr.do_send(Notify { message, kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{NotificationRecorder, TakeNotifications};

    #[actix_rt::test]
    async fn test_newest_replaces_current() {
        let handle = NotificationHandle::start(Duration::from_secs(10));

        handle.notify("first", NotificationKind::Success).await.unwrap();
        let second = handle.notify("second", NotificationKind::Error).await.unwrap();

        let current = handle.current().await.unwrap();
        assert_eq!(current.id, second);
        assert_eq!(current.message, "second");
        assert_eq!(current.kind, NotificationKind::Error);
    }

    #[actix_rt::test]
    async fn test_auto_dismiss_after_ttl() {
        let handle = NotificationHandle::start(Duration::from_millis(50));
        handle.notify("saved", NotificationKind::Success).await.unwrap();
        assert!(handle.current().await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(handle.current().await, None);
    }

    #[actix_rt::test]
    async fn test_replacement_restarts_timer() {
        let handle = NotificationHandle::start(Duration::from_millis(150));
        handle.notify("first", NotificationKind::Success).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.notify("second", NotificationKind::Success).await.unwrap();

        // The first timer would have fired by now
        tokio::time::sleep(Duration::from_millis(90)).await;
        assert_eq!(handle.current().await.map(|n| n.message), Some("second".to_string()));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(handle.current().await, None);
    }

    #[actix_rt::test]
    async fn test_dismiss_only_matching() {
        let handle = NotificationHandle::start(Duration::from_secs(10));
        let first = handle.notify("first", NotificationKind::Success).await.unwrap();
        handle.notify("second", NotificationKind::Success).await.unwrap();

        handle.dismiss(Some(first));
        assert_eq!(handle.current().await.map(|n| n.message), Some("second".to_string()));

        handle.dismiss(None);
        assert_eq!(handle.current().await, None);
    }

    #[actix_rt::test]
    async fn test_subscribers_see_changes() {
        let handle = NotificationHandle::start(Duration::from_millis(30));
        let recorder = NotificationRecorder::default().start();
        handle.subscribe(recorder.clone().recipient());

        handle.error("boom");
        tokio::time::sleep(Duration::from_millis(80)).await;

        let seen = recorder.send(TakeNotifications).await.unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].as_ref().map(|n| n.message.as_str()), Some("boom"));
        assert_eq!(seen[1], None);
    }
}
