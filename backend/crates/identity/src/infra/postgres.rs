//! PostgreSQL Repository Implementation
//!
//! Uniqueness is enforced by the table's constraints, so concurrent
//! inserts race safely; the losing insert surfaces as a duplicate error
//! through the `From<sqlx::Error>` conversion on `AuthError`.

use platform::password::CredentialHasher;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::validation::{PasswordPolicy, validate};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
    hasher: CredentialHasher,
}

impl PgUserRepository {
    pub fn new(pool: PgPool, hasher: CredentialHasher) -> Self {
        Self { pool, hasher }
    }

    /// Open a pool against `database_url` and bring the schema up to date.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        hasher: CredentialHasher,
    ) -> AuthResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        tracing::info!(max_connections, "Connected to database");

        sqlx::migrate!("../../../database/migrations")
            .run(&pool)
            .await
            .map_err(|e| AuthError::Internal(format!("Migration failed: {e}")))?;

        tracing::info!("Migrations completed");

        Ok(Self::new(pool, hasher))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgUserRepository {
    async fn count(&self) -> AuthResult<usize> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        usize::try_from(count).map_err(|e| AuthError::Internal(format!("Invalid row count: {e}")))
    }

    async fn is_empty(&self) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users)")
            .fetch_one(&self.pool)
            .await?;

        Ok(!exists)
    }

    async fn create(&self, user: &mut User) -> AuthResult<()> {
        validate(user, PasswordPolicy::Required)?;
        let digest = self.hasher.hash(&user.password)?;

        sqlx::query(
            r#"
            INSERT INTO users (
                login,
                username,
                email,
                encrypted_password
            ) VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&user.login)
        .bind(&user.username)
        .bind(&user.email)
        .bind(digest.as_phc_string())
        .execute(&self.pool)
        .await?;

        user.sanitize();
        user.encrypted_password = digest.into_phc_string();

        tracing::debug!(login = %user.login, "User inserted");
        Ok(())
    }

    async fn find_by_login(&self, login: &str) -> AuthResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                login,
                username,
                email,
                encrypted_password
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::from).ok_or(AuthError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                login,
                username,
                email,
                encrypted_password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::from).ok_or(AuthError::NotFound)
    }

    async fn delete_by_login(&self, login: &str) -> AuthResult<()> {
        let deleted = sqlx::query("DELETE FROM users WHERE login = $1")
            .bind(login)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_email(&self, email: &str) -> AuthResult<()> {
        let deleted = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let new_digest = if user.password.is_empty() {
            None
        } else {
            validate(user, PasswordPolicy::Required)?;
            Some(self.hasher.hash(&user.password)?.into_phc_string())
        };

        let mut tx = self.pool.begin().await?;

        let stored = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                login,
                username,
                email,
                encrypted_password
            FROM users
            WHERE login = $1
            FOR UPDATE
            "#,
        )
        .bind(&user.login)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AuthError::NotFound)?;

        let encrypted_password = match new_digest {
            Some(digest) => digest,
            None => {
                let mut candidate = user.clone();
                candidate.encrypted_password = stored.encrypted_password.clone();
                validate(&candidate, PasswordPolicy::Optional)?;
                stored.encrypted_password
            }
        };

        if user.email != stored.email {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND login <> $2)",
            )
            .bind(&user.email)
            .bind(&user.login)
            .fetch_one(&mut *tx)
            .await?;

            if taken {
                return Err(AuthError::DuplicateEmail);
            }
        }

        sqlx::query(
            r#"
            UPDATE users SET
                username = $2,
                email = $3,
                encrypted_password = $4,
                updated_at = NOW()
            WHERE login = $1
            "#,
        )
        .bind(&user.login)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&encrypted_password)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_password_digest(
        &self,
        login: &str,
        current_digest: &str,
        new_digest: &str,
    ) -> AuthResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                encrypted_password = $3,
                updated_at = NOW()
            WHERE login = $1 AND encrypted_password = $2
            "#,
        )
        .bind(login)
        .bind(current_digest)
        .bind(new_digest)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    login: String,
    username: String,
    email: String,
    encrypted_password: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            login: row.login,
            username: row.username,
            email: row.email,
            password: String::new(),
            encrypted_password: row.encrypted_password,
        }
    }
}
