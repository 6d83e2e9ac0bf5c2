//! Authenticate Use Case
//!
//! Resolves a bearer token to the user it was issued for.

use std::sync::Arc;

use platform::token::TokenService;

use crate::domain::entity::user::User;
use crate::domain::repository::{UserRepository, find_by_login_or_email};
use crate::error::{AuthError, AuthResult};

/// Authenticate use case
pub struct AuthenticateUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
}

impl<R> AuthenticateUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenService>) -> Self {
        Self { repo, tokens }
    }

    /// Only access tokens are accepted. A valid token whose subject no
    /// longer exists is treated as invalid.
    pub async fn execute(&self, token: &str) -> AuthResult<User> {
        let claims = self.tokens.verify_access(token)?;

        match find_by_login_or_email(&*self.repo, claims.subject()).await {
            Ok(user) => Ok(user.sanitized()),
            Err(AuthError::NotFound) => {
                tracing::debug!(subject = %claims.subject(), "Token subject no longer exists");
                Err(AuthError::InvalidToken)
            }
            Err(e) => Err(e),
        }
    }
}
