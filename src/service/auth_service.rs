use crate::db::accounts::AccountStorage;
use crate::db::models::{Account, now};
use crate::error::VaultError;
use crate::service::tokens::{IssuedToken, TokenSigner};
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use tracing::{debug, info};
use uuid::Uuid;

/// Well-formed argon2id hash that matches no password. Verifying against it
/// keeps the unknown-username path as slow as the wrong-password path.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub account: Account,
    /// Present only when the server issues tokens on registration.
    pub token: Option<IssuedToken>,
}

#[derive(Clone)]
pub struct AuthService {
    accounts: AccountStorage,
    tokens: TokenSigner,
    issue_token_on_register: bool,
}

impl AuthService {
    pub fn new(
        accounts: AccountStorage,
        tokens: TokenSigner,
        issue_token_on_register: bool,
    ) -> Self {
        Self {
            accounts,
            tokens,
            issue_token_on_register,
        }
    }

    pub fn tokens(&self) -> &TokenSigner {
        &self.tokens
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Registration, VaultError> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(VaultError::InvalidInput(
                "Username and password are required".to_string(),
            ));
        }
        if self.accounts.username_exists(username).await? {
            return Err(VaultError::Conflict("Username already exists".to_string()));
        }

        let password_hash = hash_password(password.to_string()).await?;
        let account = Account {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            created_at: now(),
        };
        // the UNIQUE constraint still catches a concurrent registration
        self.accounts.insert(&account).await?;
        info!(account_id = %account.id, username = %account.username, "account registered");

        let token = if self.issue_token_on_register {
            Some(self.tokens.mint(account.id)?)
        } else {
            None
        };
        Ok(Registration { account, token })
    }

    /// Unknown username and wrong password fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, VaultError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(VaultError::InvalidCredentials);
        }

        let account = self.accounts.find_by_username(username).await?;
        let (stored_hash, account_id) = match &account {
            Some(acc) => (acc.password_hash.clone(), Some(acc.id)),
            None => (DUMMY_HASH.to_string(), None),
        };
        let matches = verify_password(password.to_string(), stored_hash).await?;

        match account_id {
            Some(id) if matches => {
                let issued = self.tokens.mint(id)?;
                info!(account_id = %id, "login succeeded");
                Ok(issued)
            }
            _ => {
                debug!(username = %username, "login rejected");
                Err(VaultError::InvalidCredentials)
            }
        }
    }

    /// Resolve the account behind an authenticated identity.
    pub async fn account(&self, id: Uuid) -> Result<Account, VaultError> {
        self.accounts
            .get_by_id(id)
            .await?
            .ok_or(VaultError::Unauthorized("account no longer exists"))
    }
}

async fn hash_password(raw: String) -> Result<String, VaultError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .map(|h| h.to_string())
    })
    .await
    .map_err(|e| VaultError::Internal(format!("hashing task failed: {e}")))?
    .map_err(|e| VaultError::Internal(format!("password hashing failed: {e}")))
}

async fn verify_password(raw: String, stored_hash: String) -> Result<bool, VaultError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored_hash)?;
        Ok::<_, argon2::password_hash::Error>(
            Argon2::default()
                .verify_password(raw.as_bytes(), &parsed)
                .is_ok(),
        )
    })
    .await
    .map_err(|e| VaultError::Internal(format!("verification task failed: {e}")))?
    .map_err(|e| VaultError::Internal(format!("stored password hash is malformed: {e}")))
}
