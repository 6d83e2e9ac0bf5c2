//! API DTOs (Data Transfer Objects)
//!
//! Request fields default to empty so that a missing field reaches
//! validation instead of failing deserialization.

use platform::token::TokenPair;
use serde::{Deserialize, Serialize};

use crate::domain::entity::user::User;

// ============================================================================
// Users
// ============================================================================

/// POST /users request
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    pub login: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub login: String,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            login: user.login.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// POST /users response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

// ============================================================================
// Sessions
// ============================================================================

/// POST /sessions request
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateSessionRequest {
    /// Login, or email if it contains `@`
    pub login_or_email: String,
    pub password: String,
}

/// POST /sessions response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp
    pub access_expires_at: i64,
    /// Unix timestamp
    pub refresh_expires_at: i64,
}

impl From<TokenPair> for SessionResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            access_expires_at: pair.access_expires_at,
            refresh_expires_at: pair.refresh_expires_at,
        }
    }
}
