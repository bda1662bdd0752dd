use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::TypedHeader;
use headers::Authorization;
use headers::authorization::Bearer;
use uuid::Uuid;

use crate::error::VaultError;
use crate::router::VaultState;

/// Identity resolved from a valid bearer token. Handlers that take this
/// extractor never run for anonymous or badly authenticated requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub account_id: Uuid,
}

/// Resolve `Authorization: Bearer <token>` into an account id.
/// Absent, malformed, badly signed and expired tokens are all `Unauthorized`.
pub async fn resolve_identity(
    parts: &mut Parts,
    state: &VaultState,
) -> Result<AuthenticatedUser, VaultError> {
    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .map_err(|_| VaultError::Unauthorized("Missing or malformed bearer token"))?;

    let account_id = state.tokens.verify(bearer.token())?;
    Ok(AuthenticatedUser { account_id })
}

/// Gate layered in front of every `/api/passwords` route. On success the
/// identity is attached to the request extensions for the handlers.
pub async fn require_auth(
    State(state): State<VaultState>,
    req: Request,
    next: Next,
) -> Result<Response, VaultError> {
    let (mut parts, body) = req.into_parts();
    let user = resolve_identity(&mut parts, &state).await?;
    parts.extensions.insert(user);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

impl FromRequestParts<VaultState> for AuthenticatedUser {
    type Rejection = VaultError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &VaultState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(*user);
        }
        resolve_identity(parts, state).await
    }
}
