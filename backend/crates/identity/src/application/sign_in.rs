//! Sign In Use Case
//!
//! Checks a login (or email) and password, then issues a token pair.

use std::sync::Arc;

use platform::password::CredentialHasher;
use platform::token::{TokenPair, TokenService};

use crate::domain::entity::user::User;
use crate::domain::repository::{UserRepository, find_by_login_or_email};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    /// Login, or email if it contains `@`
    pub login_or_email: String,
    pub password: String,
}

/// Sign in use case
pub struct SignInUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    hasher: CredentialHasher,
    tokens: Arc<TokenService>,
}

impl<R> SignInUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, hasher: CredentialHasher, tokens: Arc<TokenService>) -> Self {
        Self {
            repo,
            hasher,
            tokens,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<TokenPair> {
        if input.login_or_email.is_empty() || input.password.is_empty() {
            return Err(AuthError::BadRequest(
                "login/email and password are required".to_string(),
            ));
        }

        // Unknown identity and wrong password look the same to the caller
        let user = match find_by_login_or_email(&*self.repo, &input.login_or_email).await {
            Ok(user) => user,
            Err(AuthError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e),
        };

        if !self.hasher.verify(&user.encrypted_password, &input.password) {
            return Err(AuthError::InvalidCredentials);
        }

        // Upgrade digests made with an older work factor
        if self.hasher.needs_rehash(&user.encrypted_password) {
            match self.upgrade_digest(&user, &input.password).await {
                Ok(true) => tracing::debug!(login = %user.login, "Password digest upgraded"),
                Ok(false) => {
                    tracing::debug!(login = %user.login, "Digest changed meanwhile, upgrade skipped")
                }
                Err(e) => {
                    tracing::warn!(login = %user.login, error = %e, "Password digest upgrade failed")
                }
            }
        }

        let tokens = self.tokens.issue(&input.login_or_email)?;

        tracing::info!(login = %user.login, "User signed in");

        Ok(tokens)
    }

    /// Store a fresh digest of `password`, replacing only the digest `user`
    /// was verified against.
    async fn upgrade_digest(&self, user: &User, password: &str) -> AuthResult<bool> {
        let digest = self.hasher.hash(password)?;
        self.repo
            .update_password_digest(
                &user.login,
                &user.encrypted_password,
                digest.as_phc_string(),
            )
            .await
    }
}
