use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::db::models::PasswordRecord;
use crate::error::{ApiErrorBody, VaultError};
use crate::types::auth::{AccountResponse, CredentialsRequest, LoginResponse, RegisterResponse};
use crate::types::passwords::{CreatePasswordRequest, MessageResponse, UpdatePasswordRequest};

/// Client-held login state. Every authenticated call takes it explicitly;
/// dropping it (or calling [`Session::logout`]) is the only way to log out.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    expires_at: Option<i64>,
}

impl Session {
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Unix seconds the server gave as the token's expiry, when known.
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    /// Tokens are never revoked server-side; logging out discards the local copy.
    pub fn logout(self) {}
}

/// Typed client for the vault HTTP API.
#[derive(Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    base: Url,
}

impl VaultClient {
    pub fn new(base_url: &str) -> Result<Self, VaultError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("passvault-client/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .no_proxy()
            .build()?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, VaultError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(Self { http, base })
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RegisterResponse, VaultError> {
        let req = self
            .request(Method::POST, "api/auth/register")?
            .json(&credentials(username, password));
        Self::send_json(req).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, VaultError> {
        let req = self
            .request(Method::POST, "api/auth/login")?
            .json(&credentials(username, password));
        let resp: LoginResponse = Self::send_json(req).await?;
        Ok(Session {
            token: resp.token,
            expires_at: Some(resp.expires_at),
        })
    }

    pub async fn me(&self, session: &Session) -> Result<AccountResponse, VaultError> {
        let req = self.authed(Method::GET, "api/auth/me", session)?;
        Self::send_json(req).await
    }

    pub async fn list(
        &self,
        session: &Session,
        search: Option<&str>,
    ) -> Result<Vec<PasswordRecord>, VaultError> {
        let mut req = self.authed(Method::GET, "api/passwords", session)?;
        if let Some(term) = search {
            req = req.query(&[("search", term)]);
        }
        Self::send_json(req).await
    }

    pub async fn get(&self, session: &Session, id: Uuid) -> Result<PasswordRecord, VaultError> {
        let req = self.authed(Method::GET, &format!("api/passwords/{id}"), session)?;
        Self::send_json(req).await
    }

    pub async fn create(
        &self,
        session: &Session,
        entry: &CreatePasswordRequest,
    ) -> Result<PasswordRecord, VaultError> {
        let req = self.authed(Method::POST, "api/passwords", session)?.json(entry);
        Self::send_json(req).await
    }

    pub async fn update(
        &self,
        session: &Session,
        id: Uuid,
        changes: &UpdatePasswordRequest,
    ) -> Result<PasswordRecord, VaultError> {
        let req = self
            .authed(Method::PUT, &format!("api/passwords/{id}"), session)?
            .json(changes);
        Self::send_json(req).await
    }

    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<String, VaultError> {
        let req = self.authed(Method::DELETE, &format!("api/passwords/{id}"), session)?;
        let resp: MessageResponse = Self::send_json(req).await?;
        Ok(resp.message)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, VaultError> {
        let url = self.base.join(path)?;
        Ok(self.http.request(method, url))
    }

    fn authed(
        &self,
        method: Method,
        path: &str,
        session: &Session,
    ) -> Result<RequestBuilder, VaultError> {
        Ok(self.request(method, path)?.bearer_auth(session.token()))
    }

    async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, VaultError> {
        let resp = req.send().await?;
        let resp = Self::check_status(resp).await?;
        Ok(resp.json::<T>().await?)
    }

    /// Turn a non-2xx response into `VaultError::Remote`, keeping the server's message.
    async fn check_status(resp: Response) -> Result<Response, VaultError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let bytes = resp.bytes().await?;
        let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
            .map(|b| b.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
        Err(VaultError::Remote { status, message })
    }
}

fn credentials(username: &str, password: &str) -> CredentialsRequest {
    CredentialsRequest {
        username: username.to_string(),
        password: password.to_string(),
    }
}
