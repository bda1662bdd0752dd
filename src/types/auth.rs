use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /api/auth/register` and `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

pub type RegisterRequest = CredentialsRequest;
pub type LoginRequest = CredentialsRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Unix seconds after which the token is rejected.
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
}

/// `GET /api/auth/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub username: String,
}
