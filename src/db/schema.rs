//! SQL DDL for initializing the vault storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `accounts.id` / `passwords.id`: UUID v4 text primary keys
/// - `accounts.username` UNIQUE (duplicate registrations fail at insert)
/// - `passwords.owner_id` foreign key to `accounts(id)`
/// - timestamps as RFC3339 UTC text with fixed microsecond precision
/// - composite index for the owner-scoped, newest-first listing
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL, -- argon2id PHC string
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS passwords (
    id TEXT PRIMARY KEY NOT NULL,
    owner_id TEXT NOT NULL REFERENCES accounts(id),
    website TEXT NOT NULL,
    username TEXT NOT NULL,
    secret TEXT NOT NULL, -- stored in clear text
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_passwords_owner ON passwords(owner_id, created_at);
"#;
