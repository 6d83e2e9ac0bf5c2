//! Identity Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - User entity, validation rules, repository trait
//! - `application/` - Use cases and configuration
//! - `infra/` - In-memory and PostgreSQL repositories, backend selection
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - User registration with login, username, email and password
//! - Sign-in by login or email, issuing an access + refresh token pair
//! - Bearer-token authentication for private routes
//!
//! ## Security Model
//! - Passwords hashed with Argon2id; plaintext is never stored or returned
//! - Stateless HS256 tokens; validity is signature + expiry only
//! - Unknown user and wrong password produce the same error

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use domain::entity::user::User;
pub use error::{AuthError, AuthResult};
pub use infra::store::{StorageBackend, StorageConfig, UserStore};
pub use presentation::router::identity_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
