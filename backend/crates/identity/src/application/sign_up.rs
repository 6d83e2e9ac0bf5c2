//! Sign Up Use Case
//!
//! Registers a new user and issues its first token pair.

use std::sync::Arc;

use platform::token::{TokenPair, TokenService};

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::AuthResult;

/// Sign up input
pub struct SignUpInput {
    pub login: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Sign up output
pub struct SignUpOutput {
    /// The stored user, both secret fields cleared
    pub user: User,
    pub tokens: TokenPair,
}

/// Sign up use case
pub struct SignUpUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
}

impl<R> SignUpUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenService>) -> Self {
        Self { repo, tokens }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let mut user = User::new(input.login, input.username, input.email, input.password);

        // Validates, hashes, and enforces uniqueness
        self.repo.create(&mut user).await?;

        let tokens = self.tokens.issue(&user.login)?;

        tracing::info!(login = %user.login, "User signed up");

        Ok(SignUpOutput {
            user: user.sanitized(),
            tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::infra::memory::MemoryUserRepository;
    use platform::password::{CredentialHasher, HashCost};

    fn use_case() -> (SignUpUseCase<MemoryUserRepository>, Arc<TokenService>) {
        let hasher = CredentialHasher::new(HashCost {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let repo = Arc::new(MemoryUserRepository::new(hasher));
        let tokens = Arc::new(TokenService::with_default_ttls(b"sign-up-test-secret"));
        (SignUpUseCase::new(repo, tokens.clone()), tokens)
    }

    fn input(login: &str, email: &str) -> SignUpInput {
        SignUpInput {
            login: login.to_string(),
            username: login.to_string(),
            email: email.to_string(),
            password: "Secret123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_returns_sanitized_user_and_tokens() {
        let (use_case, tokens) = use_case();

        let output = use_case
            .execute(input("alice", "alice@example.com"))
            .await
            .unwrap();

        assert_eq!(output.user.login, "alice");
        assert!(output.user.password.is_empty());
        assert!(output.user.encrypted_password.is_empty());

        let claims = tokens.verify_access(&output.tokens.access_token).unwrap();
        assert_eq!(claims.subject(), "alice");
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_login() {
        let (use_case, _) = use_case();
        use_case
            .execute(input("alice", "alice@example.com"))
            .await
            .unwrap();

        let result = use_case.execute(input("alice", "other@example.com")).await;
        assert!(matches!(result, Err(AuthError::DuplicateLogin)));
    }

    #[tokio::test]
    async fn test_sign_up_invalid_email() {
        let (use_case, _) = use_case();
        let result = use_case.execute(input("alice", "not-an-email")).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }
}
