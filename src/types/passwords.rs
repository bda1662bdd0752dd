use crate::db::models::{NewPassword, PasswordChanges};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/passwords`.
///
/// `password` is accepted as an alias of `secret`. An `ownerId` field is
/// tolerated and discarded; any other unknown field is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePasswordRequest {
    pub website: String,
    pub username: String,
    #[serde(alias = "password")]
    pub secret: String,
    #[serde(rename = "ownerId", default, skip_serializing)]
    pub _owner_id: Option<IgnoredAny>,
}

/// Body of `PUT /api/passwords/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePasswordRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, alias = "password", skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(rename = "ownerId", default, skip_serializing)]
    pub _owner_id: Option<IgnoredAny>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl CreatePasswordRequest {
    pub fn new(
        website: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            website: website.into(),
            username: username.into(),
            secret: secret.into(),
            _owner_id: None,
        }
    }
}

impl From<CreatePasswordRequest> for NewPassword {
    fn from(r: CreatePasswordRequest) -> Self {
        NewPassword {
            website: r.website,
            username: r.username,
            secret: r.secret,
        }
    }
}

impl From<UpdatePasswordRequest> for PasswordChanges {
    fn from(r: UpdatePasswordRequest) -> Self {
        PasswordChanges {
            website: r.website,
            username: r.username,
            secret: r.secret,
        }
    }
}
