use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, header},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::Config;
use crate::db::{AccountStorage, PasswordStorage, SqlitePool};
use crate::error::{ApiErrorBody, ErrorKind};
use crate::handlers::{auth, health, passwords};
use crate::middleware::auth::require_auth;
use crate::service::auth_service::AuthService;
use crate::service::tokens::TokenSigner;
use crate::service::vault_ops::VaultOps;

/// Shared per-request state. Everything in here is cheap to clone.
#[derive(Clone)]
pub struct VaultState {
    pub auth: AuthService,
    pub vault: VaultOps,
    pub tokens: TokenSigner,
    pub pool: SqlitePool,
}

impl VaultState {
    pub fn new(pool: SqlitePool, cfg: &Config) -> Self {
        let tokens = TokenSigner::new(&cfg.jwt_secret, cfg.token_ttl());
        let auth = AuthService::new(
            AccountStorage::new(pool.clone()),
            tokens.clone(),
            cfg.issue_token_on_register,
        );
        let vault = VaultOps::new(PasswordStorage::new(pool.clone()));
        Self {
            auth,
            vault,
            tokens,
            pool,
        }
    }
}

pub fn vault_router(state: VaultState, cfg: &Config) -> Router {
    let password_routes = Router::new()
        .route(
            "/api/passwords",
            get(passwords::list_passwords).post(passwords::create_password),
        )
        .route(
            "/api/passwords/{id}",
            get(passwords::get_password)
                .put(passwords::update_password)
                .delete(passwords::delete_password),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let router = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .merge(password_routes)
        .fallback(route_not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http());

    match cors_layer(&cfg.cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiErrorBody {
            code: ErrorKind::NotFound.code().to_string(),
            message: "route not found".to_string(),
        }),
    )
        .into_response()
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("<non-string panic payload>");
    error!(panic = %detail, "handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiErrorBody {
            code: ErrorKind::Internal.code().to_string(),
            message: "An internal server error occurred.".to_string(),
        }),
    )
        .into_response()
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| {
            HeaderValue::from_str(o)
                .inspect_err(|e| warn!(origin = %o, error = %e, "ignoring invalid CORS origin"))
                .ok()
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
    )
}
