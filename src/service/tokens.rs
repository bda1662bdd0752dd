use crate::error::VaultError;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// JWT claims carried by a bearer token. `sub` is the account id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly minted bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// Stateless HS256 token minting and verification. Nothing is persisted:
/// a token is valid exactly when its signature checks out and `exp` is in the future.
#[derive(Clone)]
pub struct TokenSigner {
    inner: Arc<SignerKeys>,
}

struct SignerKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            inner: Arc::new(SignerKeys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                validation,
                ttl,
            }),
        }
    }

    pub fn mint(&self, account_id: Uuid) -> Result<IssuedToken, VaultError> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(self.inner.ttl.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| VaultError::InvalidConfig("token lifetime is out of range".into()))?;
        let claims = Claims {
            sub: account_id.to_string(),
            iat: now,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.inner.encoding)
            .map_err(|e| VaultError::Internal(format!("failed to sign token: {e}")))?;
        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Decode and check a token, returning the account id it is bound to.
    pub fn verify(&self, token: &str) -> Result<Uuid, VaultError> {
        let data = decode::<Claims>(token, &self.inner.decoding, &self.inner.validation)?;
        Uuid::parse_str(&data.claims.sub).map_err(|e| {
            debug!(error = %e, "token subject is not an account id");
            VaultError::Unauthorized("Invalid or expired token")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret", Duration::from_secs(60))
    }

    #[test]
    fn minted_token_verifies_to_same_account() {
        let signer = signer();
        let id = Uuid::new_v4();
        let issued = signer.mint(id).unwrap();
        assert_eq!(signer.verify(&issued.token).unwrap(), id);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = TokenSigner::new("other-secret", Duration::from_secs(60));
        let issued = other.mint(Uuid::new_v4()).unwrap();
        assert!(matches!(signer().verify(&issued.token), Err(VaultError::Token(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = signer();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: now - 120,
            exp: now - 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        let err = signer.verify(&token).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Unauthorized);
    }

    #[test]
    fn expiry_follows_ttl() {
        let issued = signer().mint(Uuid::new_v4()).unwrap();
        let now = Utc::now().timestamp();
        assert!((now + 58..=now + 60).contains(&issued.expires_at));
    }

    #[test]
    fn out_of_range_ttl_fails_to_mint() {
        let signer = TokenSigner::new("test-secret", Duration::from_secs(u64::MAX));
        let err = signer.mint(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, VaultError::InvalidConfig(_)));

        let signer = TokenSigner::new("test-secret", Duration::from_secs(i64::MAX as u64));
        assert!(signer.mint(Uuid::new_v4()).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(signer().verify("not.a.jwt").is_err());
        assert!(signer().verify("").is_err());
    }
}
