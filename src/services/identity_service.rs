use crate::domain::user::{Identity, UserId};
use crate::error::{AppError, Result};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct Claims {
    sub: UserId,
    name: String,
    exp: usize,
}

impl Claims {
    fn new(user_id: UserId, username: &str, ttl_secs: u64) -> Self {
        let expiration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(std::time::Duration::from_secs(0))
            .as_secs() as usize
            + ttl_secs as usize;

        Self { sub: user_id, name: username.to_owned(), exp: expiration }
    }
}

/// Narrow interface over the external identity provider: bearer tokens in,
/// stable user identities out. Account management lives elsewhere; this
/// service only verifies (and, for tooling and tests, mints) tokens.
#[derive(Clone)]
pub struct IdentityService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: u64,
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService").field("token_ttl_secs", &self.token_ttl_secs).finish_non_exhaustive()
    }
}

impl IdentityService {
    #[must_use]
    pub fn new(secret: &str, token_ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_secs,
        }
    }

    /// Verifies a bearer token into the identity it carries.
    ///
    /// # Errors
    /// Returns `AppError::Unauthenticated` for expired, malformed, or
    /// wrongly-signed tokens.
    pub fn verify(&self, token: &str) -> Result<Identity> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AppError::Unauthenticated)?;

        Ok(Identity { user_id: token_data.claims.sub, username: token_data.claims.name })
    }

    /// Mints a token for the given identity.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if signing fails.
    pub fn issue(&self, user_id: UserId, username: &str) -> Result<String> {
        let claims = Claims::new(user_id, username, self.token_ttl_secs);
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|_| AppError::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip() {
        let service = IdentityService::new("test_secret", 3600);
        let token = service.issue(42, "alice").unwrap();
        let identity = service.verify(&token).unwrap();

        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.username, "alice");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = IdentityService::new("secret1", 3600);
        let verifier = IdentityService::new("secret2", 3600);
        let token = issuer.issue(1, "mallory").unwrap();

        assert!(matches!(verifier.verify(&token), Err(AppError::Unauthenticated)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let service = IdentityService::new("test_secret", 3600);
        assert!(matches!(service.verify("not-a-token"), Err(AppError::Unauthenticated)));
    }
}
