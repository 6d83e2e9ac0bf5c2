//! Application Configuration
//!
//! Configuration for the identity application layer.

use std::fmt;
use std::time::Duration;

use platform::password::{CredentialHasher, HashCost};
use platform::token::{ACCESS_TOKEN_TTL_HOURS, REFRESH_TOKEN_TTL_DAYS, TokenService};

use crate::error::{AuthError, AuthResult};

/// Identity application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC key for signing bearer tokens
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime (24 hours)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (1 week)
    pub refresh_token_ttl: Duration,
    /// Argon2id work factor for stored passwords
    pub hash_cost: HashCost,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Vec::new(),
            access_token_ttl: Duration::from_secs(ACCESS_TOKEN_TTL_HOURS as u64 * 3600),
            refresh_token_ttl: Duration::from_secs(REFRESH_TOKEN_TTL_DAYS as u64 * 24 * 3600),
            hash_cost: HashCost::default(),
        }
    }
}

impl AuthConfig {
    /// Create config with a random signing key.
    ///
    /// Tokens do not survive a restart.
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = vec![0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            jwt_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development
    pub fn development() -> Self {
        Self::with_random_secret()
    }

    /// Build the token service. Fails on an empty key or a TTL chrono
    /// cannot represent.
    pub fn token_service(&self) -> AuthResult<TokenService> {
        if self.jwt_secret.is_empty() {
            return Err(AuthError::Internal("JWT secret is empty".to_string()));
        }

        let access_ttl = chrono::Duration::from_std(self.access_token_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid access token TTL: {e}")))?;
        let refresh_ttl = chrono::Duration::from_std(self.refresh_token_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid refresh token TTL: {e}")))?;

        Ok(TokenService::new(&self.jwt_secret, access_ttl, refresh_ttl))
    }

    pub fn credential_hasher(&self) -> AuthResult<CredentialHasher> {
        Ok(CredentialHasher::new(self.hash_cost)?)
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("hash_cost", &self.hash_cost)
            .finish()
    }
}
