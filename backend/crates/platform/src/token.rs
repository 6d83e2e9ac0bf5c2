//! Signed bearer tokens
//!
//! HS256 JWTs with a symmetric key held by an explicitly constructed
//! [`TokenService`]. Each login yields an access token (short-lived) and a
//! refresh token (long-lived); both carry the subject.
//!
//! Tokens are not stored anywhere. Validity is signature + expiry at the
//! moment of verification, so a token cannot be revoked before it expires.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default access token lifetime
pub const ACCESS_TOKEN_TTL_HOURS: i64 = 24;

/// Default refresh token lifetime
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Token errors.
///
/// Verification failures deliberately collapse into a single `Invalid`
/// variant. The cause is logged at debug level and never returned.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Invalid token")]
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the login or email the token was issued for
    pub login_or_email: String,
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn subject(&self) -> &str {
        &self.login_or_email
    }
}

/// Access + refresh token pair issued on a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: i64,
    pub refresh_expires_at: i64,
}

/// Issues and verifies signed tokens with one symmetric key.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// 24h access tokens, 7 day refresh tokens.
    pub fn with_default_ttls(secret: &[u8]) -> Self {
        Self::new(
            secret,
            Duration::hours(ACCESS_TOKEN_TTL_HOURS),
            Duration::days(REFRESH_TOKEN_TTL_DAYS),
        )
    }

    fn sign(
        &self,
        subject: &str,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<(String, i64), TokenError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| {
                TokenError::Signing(format!("{token_type} token lifetime out of range"))
            })?
            .timestamp();

        let claims = Claims {
            login_or_email: subject.to_string(),
            token_type,
            iat: now.timestamp(),
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok((token, exp))
    }

    /// Issue an access token and a refresh token for `subject`.
    pub fn issue(&self, subject: &str) -> Result<TokenPair, TokenError> {
        let (access_token, access_expires_at) =
            self.sign(subject, TokenType::Access, self.access_ttl)?;
        let (refresh_token, refresh_expires_at) =
            self.sign(subject, TokenType::Refresh, self.refresh_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Check signature and expiry. Clock skew is not compensated.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token verification failed");
                TokenError::Invalid
            })
    }

    /// Like [`verify`](Self::verify), but refresh tokens are rejected.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;

        if claims.token_type != TokenType::Access {
            tracing::debug!(token_type = %claims.token_type, "Non-access token presented");
            return Err(TokenError::Invalid);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("key", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::with_default_ttls(b"test_secret_key_for_testing_only")
    }

    /// Flip one character in the middle of the signature segment.
    fn tamper(token: &str) -> String {
        let sig_start = token.rfind('.').unwrap() + 1;
        let mut bytes = token.as_bytes().to_vec();
        let idx = sig_start + 5;
        bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_issue_then_verify_returns_subject() {
        let service = service();
        let pair = service.issue("alice").unwrap();

        let claims = service.verify(&pair.access_token).unwrap();
        assert_eq!(claims.subject(), "alice");
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_expiry_windows() {
        let before = Utc::now().timestamp();
        let pair = service().issue("alice@example.com").unwrap();

        let day = 24 * 3600;
        assert!(pair.access_expires_at >= before + day);
        assert!(pair.access_expires_at <= before + day + 5);
        assert!(pair.refresh_expires_at >= before + 7 * day);
        assert_ne!(pair.access_token, pair.refresh_token);
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let service = TokenService::new(
            b"test_secret_key_for_testing_only",
            Duration::hours(24),
            Duration::seconds(1_000_000_000_000_000),
        );

        let err = service.issue("alice").unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));
        assert!(err.to_string().contains("refresh"));
    }

    #[test]
    fn test_refresh_token_carries_subject() {
        let service = service();
        let pair = service.issue("alice").unwrap();

        let claims = service.verify(&pair.refresh_token).unwrap();
        assert_eq!(claims.subject(), "alice");
        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_verify_access_rejects_refresh_token() {
        let service = service();
        let pair = service.issue("alice").unwrap();

        assert!(service.verify_access(&pair.access_token).is_ok());
        assert!(matches!(
            service.verify_access(&pair.refresh_token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let service = TokenService::new(
            b"test_secret_key_for_testing_only",
            Duration::seconds(-10),
            Duration::days(REFRESH_TOKEN_TTL_DAYS),
        );
        let pair = service.issue("alice").unwrap();

        assert!(matches!(
            service.verify(&pair.access_token),
            Err(TokenError::Invalid)
        ));
        // the refresh token from the same issuance is still good
        assert!(service.verify(&pair.refresh_token).is_ok());
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let service = service();
        let pair = service.issue("alice").unwrap();

        let result = service.verify(&tamper(&pair.access_token));
        assert!(matches!(result, Err(TokenError::Invalid)));
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let issuer = TokenService::with_default_ttls(b"secret_one");
        let verifier = TokenService::with_default_ttls(b"secret_two");

        let pair = issuer.issue("alice").unwrap();
        assert!(matches!(
            verifier.verify(&pair.access_token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_malformed_token_is_invalid() {
        let service = service();
        assert!(matches!(service.verify(""), Err(TokenError::Invalid)));
        assert!(matches!(
            service.verify("invalid.token.here"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_error_message_has_no_detail() {
        assert_eq!(TokenError::Invalid.to_string(), "Invalid token");
    }

    #[test]
    fn test_token_type_serialization() {
        assert_eq!(
            serde_json::to_string(&TokenType::Access).unwrap(),
            r#""access""#
        );
        assert_eq!(
            serde_json::to_string(&TokenType::Refresh).unwrap(),
            r#""refresh""#
        );
    }
}
