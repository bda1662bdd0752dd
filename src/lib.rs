pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod types;

pub use api::vault_client::{Session, VaultClient};
pub use error::{ErrorKind, VaultError};
pub use router::{VaultState, vault_router};
