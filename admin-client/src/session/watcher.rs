// admin-client/src/session/watcher.rs
use actix::prelude::*;
use std::time::Duration;

use super::store::{ChangeOrigin, SessionChanged, SessionStore, SubscriptionId};

/// Polls the session storage and raises an external change signal when the
/// stored record differs from the last one seen, e.g. after a logout in
/// another terminal sharing the same session file.
pub struct SessionWatcher {
    store: SessionStore,
    interval: Duration,
    last_seen: Option<String>,
    subscription: Option<SubscriptionId>,
}

impl SessionWatcher {
    pub fn new(store: SessionStore, interval: Duration) -> Self {
        Self {
            store,
            interval,
            last_seen: None,
            subscription: None,
        }
    }

    fn poll(&mut self) {
        let current = self.store.raw();
        if current != self.last_seen {
            tracing::info!("Session storage changed outside this process");
            self.last_seen = current;
            self.store.notify_external();
        }
    }
}

impl Actor for SessionWatcher {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.last_seen = self.store.raw();
        self.subscription = Some(self.store.subscribe(ctx.address().recipient()));
        tracing::debug!("Session watcher polling every {:?}", self.interval);

        ctx.run_interval(self.interval, |act, _ctx| {
            act.poll();
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(id) = self.subscription.take() {
            self.store.unsubscribe(id);
        }
    }
}

// Changes made through this process's store are already signalled
impl Handler<SessionChanged> for SessionWatcher {
    type Result = ();

    fn handle(&mut self, msg: SessionChanged, _ctx: &mut Self::Context) {
        if msg.origin == ChangeOrigin::Local {
            self.last_seen = self.store.raw();
        }
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct StopWatching;

impl Handler<StopWatching> for SessionWatcher {
    type Result = ();

    fn handle(&mut self, _msg: StopWatching, ctx: &mut Self::Context) {
        tracing::debug!("Session watcher stopped");
        ctx.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FileStorage;
    use crate::testing::{SignalRecorder, TakeSignals};
    use common::Identity;
    use std::sync::Arc;

    #[actix_rt::test]
    async fn test_detects_logout_from_other_process() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        // Two stores over one file stand in for two terminals
        let here = SessionStore::new(Arc::new(FileStorage::new(&path)));
        let elsewhere = SessionStore::new(Arc::new(FileStorage::new(&path)));
        here.set(&Identity::new(1, "A", "admin", "t")).unwrap();

        let recorder = SignalRecorder::default().start();
        here.subscribe(recorder.clone().recipient());
        let _watcher = SessionWatcher::new(here.clone(), Duration::from_millis(20)).start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(recorder.send(TakeSignals).await.unwrap().is_empty());

        elsewhere.clear();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let seen = recorder.send(TakeSignals).await.unwrap();
        assert_eq!(seen, vec![ChangeOrigin::External]);
        assert_eq!(here.get(), None);
    }

    #[actix_rt::test]
    async fn test_local_change_is_not_reported_as_external() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(Arc::new(FileStorage::new(dir.path().join("session.json"))));

        let recorder = SignalRecorder::default().start();
        store.subscribe(recorder.clone().recipient());
        let _watcher = SessionWatcher::new(store.clone(), Duration::from_millis(20)).start();
        tokio::time::sleep(Duration::from_millis(30)).await;

        store.set(&Identity::new(1, "A", "admin", "t")).unwrap();
        store.clear();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let seen = recorder.send(TakeSignals).await.unwrap();
        assert_eq!(seen, vec![ChangeOrigin::Local, ChangeOrigin::Local]);
    }
}
