pub mod auth_service;
pub mod tokens;
pub mod vault_ops;
