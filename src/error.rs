use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::{debug, error, warn};

#[derive(Debug, ThisError)]
pub enum VaultError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Login failure. Unknown username and wrong password both end up here.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Missing record or a record owned by someone else; never distinguished.
    #[error("password entry not found")]
    NotFound,

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Error status returned by a remote vault server to [`crate::api::vault_client::VaultClient`].
    #[error("remote error {status}: {message}")]
    Remote { status: StatusCode, message: String },
}

impl From<figment::Error> for VaultError {
    fn from(e: figment::Error) -> Self {
        VaultError::Config(Box::new(e))
    }
}

/// Client-facing error classes. Every [`VaultError`] collapses onto one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Conflict,
    Unauthorized,
    NotFound,
    Unavailable,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Unavailable => "UNAVAILABLE",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorKind::InvalidInput,
            StatusCode::CONFLICT => ErrorKind::Conflict,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Unauthorized,
            StatusCode::NOT_FOUND => ErrorKind::NotFound,
            StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY => ErrorKind::Unavailable,
            _ => ErrorKind::Internal,
        }
    }
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::InvalidInput(_) => ErrorKind::InvalidInput,
            VaultError::Conflict(_) => ErrorKind::Conflict,
            VaultError::InvalidCredentials | VaultError::Unauthorized(_) | VaultError::Token(_) => {
                ErrorKind::Unauthorized
            }
            VaultError::NotFound => ErrorKind::NotFound,
            VaultError::Unavailable(_) => ErrorKind::Unavailable,
            VaultError::DatabaseError(e) => match e {
                SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) => {
                    ErrorKind::Unavailable
                }
                _ => ErrorKind::Internal,
            },
            VaultError::Reqwest(e) if e.is_timeout() || e.is_connect() => ErrorKind::Unavailable,
            VaultError::Remote { status, .. } => ErrorKind::from_status(*status),
            VaultError::Internal(_)
            | VaultError::Config(_)
            | VaultError::InvalidConfig(_)
            | VaultError::Reqwest(_)
            | VaultError::UrlParse(_) => ErrorKind::Internal,
        }
    }

    /// Message that is safe to hand to an API caller.
    fn public_message(&self) -> String {
        match self {
            VaultError::InvalidInput(msg) | VaultError::Conflict(msg) => msg.clone(),
            VaultError::InvalidCredentials => "Invalid username or password".to_string(),
            VaultError::Unauthorized(reason) => (*reason).to_string(),
            VaultError::Token(_) => "Invalid or expired token".to_string(),
            VaultError::NotFound => "Password not found".to_string(),
            VaultError::Remote { message, .. } => message.clone(),
            other => match other.kind() {
                ErrorKind::Unavailable => "Service temporarily unavailable.".to_string(),
                _ => "An internal server error occurred.".to_string(),
            },
        }
    }
}

impl IntoResponse for VaultError {
    fn into_response(self) -> axum::response::Response {
        let kind = self.kind();
        let status = kind.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else if kind == ErrorKind::Unauthorized {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        } else {
            debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ApiErrorBody {
            code: kind.code().to_string(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Standardized API error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: VaultError) -> (StatusCode, ApiErrorBody) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn pool_timeout_is_unavailable_without_detail() {
        let (status, body) = body_of(VaultError::DatabaseError(SqlxError::PoolTimedOut)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "UNAVAILABLE");
        assert!(!body.message.contains("pool"));
    }

    #[tokio::test]
    async fn internal_errors_hide_their_cause() {
        let (status, body) =
            body_of(VaultError::Internal("argon2 exploded at line 42".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "An internal server error occurred.");
    }

    #[tokio::test]
    async fn not_found_and_conflict_statuses() {
        let (status, body) = body_of(VaultError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, "NOT_FOUND");

        let (status, body) = body_of(VaultError::Conflict("Username already exists".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.message, "Username already exists");
    }

    #[test]
    fn remote_status_maps_back_onto_kind() {
        let err = VaultError::Remote {
            status: StatusCode::NOT_FOUND,
            message: "Password not found".into(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            ErrorKind::from_status(StatusCode::IM_A_TEAPOT),
            ErrorKind::Internal
        );
    }
}
