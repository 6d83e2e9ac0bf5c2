//! In-Memory Repository Implementation
//!
//! Two maps behind one `RwLock`: users keyed by login, and an email index
//! pointing back at the login. Both are always changed under the same
//! write guard. Digests are computed before the lock is taken.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use platform::password::CredentialHasher;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::validation::{PasswordPolicy, validate};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct Tables {
    /// login -> user
    users: HashMap<String, User>,
    /// email -> login
    emails: HashMap<String, String>,
}

/// Process-local user store. Clones share the same tables.
#[derive(Clone)]
pub struct MemoryUserRepository {
    tables: Arc<RwLock<Tables>>,
    hasher: CredentialHasher,
}

impl MemoryUserRepository {
    pub fn new(hasher: CredentialHasher) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            hasher,
        }
    }
}

impl UserRepository for MemoryUserRepository {
    async fn count(&self) -> AuthResult<usize> {
        Ok(self.tables.read().users.len())
    }

    async fn is_empty(&self) -> AuthResult<bool> {
        Ok(self.tables.read().users.is_empty())
    }

    async fn create(&self, user: &mut User) -> AuthResult<()> {
        validate(user, PasswordPolicy::Required)?;
        let digest = self.hasher.hash(&user.password)?;

        {
            let mut tables = self.tables.write();

            if tables.users.contains_key(&user.login) {
                return Err(AuthError::DuplicateLogin);
            }
            if tables.emails.contains_key(&user.email) {
                return Err(AuthError::DuplicateEmail);
            }

            user.sanitize();
            user.encrypted_password = digest.into_phc_string();

            tables
                .emails
                .insert(user.email.clone(), user.login.clone());
            tables.users.insert(user.login.clone(), user.clone());
        }

        tracing::debug!(login = %user.login, "User stored in memory");
        Ok(())
    }

    async fn find_by_login(&self, login: &str) -> AuthResult<User> {
        self.tables
            .read()
            .users
            .get(login)
            .cloned()
            .ok_or(AuthError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<User> {
        let tables = self.tables.read();
        tables
            .emails
            .get(email)
            .and_then(|login| tables.users.get(login))
            .cloned()
            .ok_or(AuthError::NotFound)
    }

    async fn delete_by_login(&self, login: &str) -> AuthResult<()> {
        let mut tables = self.tables.write();
        let user = tables.users.remove(login).ok_or(AuthError::NotFound)?;
        tables.emails.remove(&user.email);
        Ok(())
    }

    async fn delete_by_email(&self, email: &str) -> AuthResult<()> {
        let mut tables = self.tables.write();
        let login = tables.emails.remove(email).ok_or(AuthError::NotFound)?;
        tables.users.remove(&login);
        Ok(())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        // New credential: validate and hash outside the lock
        let new_digest = if user.password.is_empty() {
            None
        } else {
            validate(user, PasswordPolicy::Required)?;
            Some(self.hasher.hash(&user.password)?.into_phc_string())
        };

        let mut guard = self.tables.write();
        let tables = &mut *guard;

        let stored = tables.users.get(&user.login).ok_or(AuthError::NotFound)?;
        let old_email = stored.email.clone();

        let mut updated = user.clone();
        match new_digest {
            Some(digest) => {
                updated.sanitize();
                updated.encrypted_password = digest;
            }
            None => {
                updated.encrypted_password = stored.encrypted_password.clone();
                validate(&updated, PasswordPolicy::Optional)?;
            }
        }

        if updated.email != old_email {
            if tables.emails.contains_key(&updated.email) {
                return Err(AuthError::DuplicateEmail);
            }
            tables.emails.remove(&old_email);
            tables
                .emails
                .insert(updated.email.clone(), updated.login.clone());
        }

        tables.users.insert(updated.login.clone(), updated);
        Ok(())
    }

    async fn update_password_digest(
        &self,
        login: &str,
        current_digest: &str,
        new_digest: &str,
    ) -> AuthResult<bool> {
        let mut tables = self.tables.write();

        match tables.users.get_mut(login) {
            Some(user) if user.encrypted_password == current_digest => {
                user.encrypted_password = new_digest.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
