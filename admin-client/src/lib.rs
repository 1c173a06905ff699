// admin-client/src/lib.rs
//! Role-gated administrative client for the clinic service.
pub mod api;
pub mod auth;
pub mod cli;
pub mod error;
pub mod guards;
pub mod notification;
pub mod policy;
pub mod render;
pub mod session;
pub mod shell;
pub mod status;
pub mod validation;
pub mod views;

#[cfg(test)]
pub(crate) mod testing;

pub use api::ApiClient;
pub use auth::AuthGateway;
pub use error::{ClientError, RequestError};
pub use guards::{Navigation, Navigator, Route};
pub use notification::{Notification, NotificationHandle, NotificationKind};
pub use policy::{is_allowed, Capability};
pub use session::SessionStore;
pub use shell::Shell;
pub use status::derive_status;
