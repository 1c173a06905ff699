// admin-client/src/api/mod.rs
pub mod client;
pub mod transport;

pub use client::{interpret, ApiClient, RequestOptions};
pub use transport::{OutgoingRequest, RawResponse, ReqwestTransport, Transport, TransportError};
