pub mod config;
pub mod credential;
pub mod models;
pub mod utils;

pub use config::*;
pub use credential::*;
pub use models::*;
pub use utils::*;
