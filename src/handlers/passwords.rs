use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::db::models::PasswordRecord;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::json_body::ValidatedJson;
use crate::types::passwords::{
    CreatePasswordRequest, ListQuery, MessageResponse, UpdatePasswordRequest,
};
use crate::{VaultError, router::VaultState};

/// Ids that do not parse can never match a record.
fn entry_id(raw: &str) -> Result<Uuid, VaultError> {
    Uuid::parse_str(raw).map_err(|_| VaultError::NotFound)
}

/// GET /api/passwords
pub async fn list_passwords(
    State(state): State<VaultState>,
    user: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PasswordRecord>>, VaultError> {
    let entries = state
        .vault
        .list(user.account_id, query.search.as_deref())
        .await?;
    Ok(Json(entries))
}

/// GET /api/passwords/{id}
pub async fn get_password(
    State(state): State<VaultState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<PasswordRecord>, VaultError> {
    let entry = state.vault.get(user.account_id, entry_id(&id)?).await?;
    Ok(Json(entry))
}

/// POST /api/passwords
pub async fn create_password(
    State(state): State<VaultState>,
    user: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<CreatePasswordRequest>,
) -> Result<(StatusCode, Json<PasswordRecord>), VaultError> {
    let created = state.vault.create(user.account_id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/passwords/{id}
pub async fn update_password(
    State(state): State<VaultState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdatePasswordRequest>,
) -> Result<Json<PasswordRecord>, VaultError> {
    let updated = state
        .vault
        .update(user.account_id, entry_id(&id)?, req.into())
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/passwords/{id}
pub async fn delete_password(
    State(state): State<VaultState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, VaultError> {
    state.vault.delete(user.account_id, entry_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "Deleted successfully".to_string(),
    }))
}
