use axum::{Json, extract::State, http::StatusCode};

use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::json_body::ValidatedJson;
use crate::types::auth::{
    AccountResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};
use crate::{VaultError, router::VaultState};

/// POST /api/auth/register
pub async fn register(
    State(state): State<VaultState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), VaultError> {
    let reg = state.auth.register(&req.username, &req.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: reg.account.id,
            username: reg.account.username,
            token: reg.token.map(|t| t.token),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<VaultState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, VaultError> {
    let issued = state.auth.login(&req.username, &req.password).await?;
    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<VaultState>,
    user: AuthenticatedUser,
) -> Result<Json<AccountResponse>, VaultError> {
    let account = state.auth.account(user.account_id).await?;
    Ok(Json(AccountResponse {
        id: account.id,
        username: account.username,
    }))
}
