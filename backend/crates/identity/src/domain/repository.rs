//! Repository Traits
//!
//! Interface for user persistence. Implementations are in the
//! infrastructure layer; every backend reports the same errors for the
//! same situations.

use crate::domain::entity::user::User;
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Number of stored users
    async fn count(&self) -> AuthResult<usize>;

    /// Whether no users are stored
    async fn is_empty(&self) -> AuthResult<bool>;

    /// Validate, hash and persist a new user.
    ///
    /// Uniqueness of `login` and `email` is checked atomically with the
    /// insert. On success `user.password` is cleared and
    /// `user.encrypted_password` holds the digest.
    async fn create(&self, user: &mut User) -> AuthResult<()>;

    /// Find user by login. Fails with `NotFound` on a miss.
    async fn find_by_login(&self, login: &str) -> AuthResult<User>;

    /// Find user by email. Fails with `NotFound` on a miss.
    async fn find_by_email(&self, email: &str) -> AuthResult<User>;

    async fn delete_by_login(&self, login: &str) -> AuthResult<()>;

    async fn delete_by_email(&self, email: &str) -> AuthResult<()>;

    /// Update the user keyed by `user.login`.
    ///
    /// Changes `username` and `email`. The stored digest is replaced only
    /// when `user.password` carries a new plaintext.
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Swap the stored digest of `login` for `new_digest`, but only while
    /// it still equals `current_digest`. Profile fields are not touched.
    ///
    /// Returns `false` when no user with that login holds `current_digest`
    /// any more.
    async fn update_password_digest(
        &self,
        login: &str,
        current_digest: &str,
        new_digest: &str,
    ) -> AuthResult<bool>;
}

/// Look a subject up by email if it contains `@`, by login otherwise.
pub async fn find_by_login_or_email<R>(repo: &R, subject: &str) -> AuthResult<User>
where
    R: UserRepository,
{
    if subject.contains('@') {
        repo.find_by_email(subject).await
    } else {
        repo.find_by_login(subject).await
    }
}
