use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::db;
use crate::{VaultError, router::VaultState};

/// GET /
pub async fn root() -> &'static str {
    "passvault API"
}

/// GET /health -> 503 when the database cannot be reached.
pub async fn health(State(state): State<VaultState>) -> Result<Json<Value>, VaultError> {
    db::ping(&state.pool).await.map_err(|e| {
        VaultError::Unavailable(format!("database ping failed: {e}"))
    })?;
    Ok(Json(json!({ "status": "ok" })))
}
