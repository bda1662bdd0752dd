use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::error::VaultError;

/// Environment variable prefix, e.g. `PASSVAULT_JWT_SECRET`.
pub const ENV_PREFIX: &str = "PASSVAULT_";

/// Longest token lifetime `validate` accepts: one year.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Keys read verbatim from the environment. figment's `Env` provider would
/// parse `1234567890` or `true` into a number or bool, and `007` into `7`.
const VERBATIM_KEYS: [&str; 4] = ["database_url", "listen_addr", "jwt_secret", "loglevel"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub loglevel: String,
    /// Allowed CORS origins. Empty disables the CORS layer entirely.
    /// From the environment this is a comma-separated list, e.g.
    /// `PASSVAULT_CORS_ORIGINS=https://a.example,https://b.example`.
    #[serde(deserialize_with = "origin_list")]
    pub cors_origins: Vec<String>,
    /// Return a bearer token from `POST /api/auth/register` as well as from login.
    pub issue_token_on_register: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:passvault.db".to_string(),
            listen_addr: "0.0.0.0:4000".to_string(),
            jwt_secret: String::new(),
            token_ttl_secs: 3600,
            db_max_connections: 5,
            db_acquire_timeout_secs: 5,
            loglevel: "info".to_string(),
            cors_origins: Vec::new(),
            issue_token_on_register: false,
        }
    }
}

impl Config {
    /// Defaults overlaid with `PASSVAULT_*` environment variables.
    pub fn load() -> Result<Self, VaultError> {
        Self::figment().extract().map_err(VaultError::from)
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&VERBATIM_KEYS));
        for key in VERBATIM_KEYS {
            let var = format!("{ENV_PREFIX}{}", key.to_ascii_uppercase());
            if let Ok(value) = std::env::var(&var) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }
        figment
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(VaultError::InvalidConfig(format!(
                "{ENV_PREFIX}JWT_SECRET must be set"
            )));
        }
        if self.token_ttl_secs == 0 {
            return Err(VaultError::InvalidConfig(format!(
                "{ENV_PREFIX}TOKEN_TTL_SECS must be greater than zero"
            )));
        }
        if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(VaultError::InvalidConfig(format!(
                "{ENV_PREFIX}TOKEN_TTL_SECS must be at most {MAX_TOKEN_TTL_SECS}"
            )));
        }
        if self.db_max_connections == 0 {
            return Err(VaultError::InvalidConfig(format!(
                "{ENV_PREFIX}DB_MAX_CONNECTIONS must be greater than zero"
            )));
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn db_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }
}

/// Accepts either a sequence or a single comma-separated string.
fn origin_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Origins {
        List(Vec<String>),
        Joined(String),
    }

    let origins = match Origins::deserialize(deserializer)? {
        Origins::List(list) => list,
        Origins::Joined(joined) => joined.split(',').map(str::to_string).collect(),
    };
    Ok(origins
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect())
}
