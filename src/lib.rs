pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod heap;
pub mod middleware;
pub mod router;
pub mod service;
pub mod types;

pub use error::DeskError;
pub use service::controller::{Role, SessionContext};
pub use service::vault_actor::VaultHandle;
