//! Database module: models, schema and storage for persistent state.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool construction and schema bootstrap
//! - `accounts.rs`: identity store (`accounts` table)
//! - `passwords.rs`: owner-scoped credential store (`passwords` table)

pub mod accounts;
pub mod models;
pub mod passwords;
pub mod schema;
pub mod sqlite;

pub use accounts::AccountStorage;
pub use models::{Account, NewPassword, PasswordChanges, PasswordRecord};
pub use passwords::PasswordStorage;
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, connect, init_schema, open, ping};
