// admin-client/src/session/mod.rs
pub mod storage;
pub mod store;
pub mod watcher;

pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{ChangeOrigin, SessionChanged, SessionError, SessionStore, SubscriptionId};
pub use watcher::{SessionWatcher, StopWatching};
