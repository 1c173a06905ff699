// common/src/models/mod.rs
pub mod appointment;
pub mod clinic;
pub mod identity;

pub use appointment::*;
pub use clinic::*;
pub use identity::*;
