use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user of the vault.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// One stored website/login/secret triple, bound to exactly one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub website: String,
    pub username: String,
    pub secret: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for a new record. The owner is supplied separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPassword {
    pub website: String,
    pub username: String,
    pub secret: String,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordChanges {
    pub website: Option<String>,
    pub username: Option<String>,
    pub secret: Option<String>,
}

impl PasswordRecord {
    pub fn new(owner_id: Uuid, fields: NewPassword) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            website: fields.website,
            username: fields.username,
            secret: fields.secret,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Current time truncated to the precision the database keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC3339 so that text ordering in SQL equals time ordering.
pub fn to_db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_db_timestamp(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

pub fn from_db_uuid(raw: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
