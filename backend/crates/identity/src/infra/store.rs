//! Storage selection
//!
//! Picks a backend from configuration at startup. Callers only ever see
//! [`UserStore`], which forwards the repository contract to whichever
//! backend was chosen.

use std::fmt;

use platform::password::CredentialHasher;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::AuthResult;
use crate::infra::memory::MemoryUserRepository;
use crate::infra::postgres::PgUserRepository;

/// Default pool size for the Postgres backend
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local maps; data is lost on restart
    Memory,
    Postgres { url: String, max_connections: u32 },
}

impl fmt::Debug for StorageBackend {
    // The URL may carry credentials
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "Memory"),
            StorageBackend::Postgres {
                max_connections, ..
            } => f
                .debug_struct("Postgres")
                .field("url", &"[REDACTED]")
                .field("max_connections", max_connections)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

impl StorageConfig {
    pub fn memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
        }
    }

    pub fn postgres(url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            backend: StorageBackend::Postgres {
                url: url.into(),
                max_connections,
            },
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::memory()
    }
}

/// The configured user repository.
#[derive(Clone)]
pub enum UserStore {
    Memory(MemoryUserRepository),
    Postgres(PgUserRepository),
}

impl UserStore {
    /// Build the backend named by `config`. The Postgres backend connects
    /// and runs migrations before returning.
    pub async fn connect(config: &StorageConfig, hasher: CredentialHasher) -> AuthResult<Self> {
        let store = match &config.backend {
            StorageBackend::Memory => UserStore::Memory(MemoryUserRepository::new(hasher)),
            StorageBackend::Postgres {
                url,
                max_connections,
            } => UserStore::Postgres(PgUserRepository::connect(url, *max_connections, hasher).await?),
        };

        tracing::info!(backend = store.backend_name(), "User store ready");
        Ok(store)
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            UserStore::Memory(_) => "memory",
            UserStore::Postgres(_) => "postgres",
        }
    }
}

impl UserRepository for UserStore {
    async fn count(&self) -> AuthResult<usize> {
        match self {
            UserStore::Memory(repo) => repo.count().await,
            UserStore::Postgres(repo) => repo.count().await,
        }
    }

    async fn is_empty(&self) -> AuthResult<bool> {
        match self {
            UserStore::Memory(repo) => repo.is_empty().await,
            UserStore::Postgres(repo) => repo.is_empty().await,
        }
    }

    async fn create(&self, user: &mut User) -> AuthResult<()> {
        match self {
            UserStore::Memory(repo) => repo.create(user).await,
            UserStore::Postgres(repo) => repo.create(user).await,
        }
    }

    async fn find_by_login(&self, login: &str) -> AuthResult<User> {
        match self {
            UserStore::Memory(repo) => repo.find_by_login(login).await,
            UserStore::Postgres(repo) => repo.find_by_login(login).await,
        }
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<User> {
        match self {
            UserStore::Memory(repo) => repo.find_by_email(email).await,
            UserStore::Postgres(repo) => repo.find_by_email(email).await,
        }
    }

    async fn delete_by_login(&self, login: &str) -> AuthResult<()> {
        match self {
            UserStore::Memory(repo) => repo.delete_by_login(login).await,
            UserStore::Postgres(repo) => repo.delete_by_login(login).await,
        }
    }

    async fn delete_by_email(&self, email: &str) -> AuthResult<()> {
        match self {
            UserStore::Memory(repo) => repo.delete_by_email(email).await,
            UserStore::Postgres(repo) => repo.delete_by_email(email).await,
        }
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        match self {
            UserStore::Memory(repo) => repo.update(user).await,
            UserStore::Postgres(repo) => repo.update(user).await,
        }
    }

    async fn update_password_digest(
        &self,
        login: &str,
        current_digest: &str,
        new_digest: &str,
    ) -> AuthResult<bool> {
        match self {
            UserStore::Memory(repo) => {
                repo.update_password_digest(login, current_digest, new_digest)
                    .await
            }
            UserStore::Postgres(repo) => {
                repo.update_password_digest(login, current_digest, new_digest)
                    .await
            }
        }
    }
}
