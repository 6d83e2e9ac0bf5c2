//! Identity Error Types
//!
//! This module provides identity-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::PasswordHashError;
use platform::token::TokenError;
use thiserror::Error;

use crate::domain::validation::ValidationError;

/// Identity-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Unique constraint on `users.login`, named in the users migration
const LOGIN_UNIQUE_CONSTRAINT: &str = "users_login_key";

/// Unique constraint on `users.email`
const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

/// SQLSTATE classes meaning the server is unreachable or refusing work:
/// connection exception, insufficient resources, operator intervention.
const UNAVAILABLE_CLASSES: [&str; 3] = ["08", "53", "57"];

/// Identity-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// User failed field validation
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Login already registered
    #[error("login is already taken")]
    DuplicateLogin,

    /// Email already registered
    #[error("email is already registered")]
    DuplicateEmail,

    /// No user with that login or email
    #[error("User not found")]
    NotFound,

    /// Malformed or incomplete request
    #[error("{0}")]
    BadRequest(String),

    /// Unknown identity or wrong password. One message for both.
    #[error("incorrect login/email or password")]
    InvalidCredentials,

    /// Token failed verification or its subject no longer exists
    #[error("Invalid token")]
    InvalidToken,

    /// Missing or malformed Authorization header
    #[error("Authentication required")]
    Unauthorized,

    /// Storage backend unreachable
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::DuplicateLogin | AuthError::DuplicateEmail => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) | AuthError::DuplicateLogin | AuthError::DuplicateEmail => {
                ErrorKind::UnprocessableEntity
            }
            AuthError::NotFound => ErrorKind::NotFound,
            AuthError::BadRequest(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::Unauthorized => {
                ErrorKind::Unauthorized
            }
            AuthError::StorageUnavailable(_) => ErrorKind::ServiceUnavailable,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError.
    ///
    /// Server-side failures get a generic message; their detail stays in
    /// the logs.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::StorageUnavailable(_) => {
                AppError::service_unavailable("Storage is temporarily unavailable")
                    .with_action("Retry the request later")
            }
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::internal("An internal error occurred")
            }
            AuthError::DuplicateLogin => {
                AppError::new(self.kind(), self.to_string()).with_action("Choose a different login")
            }
            AuthError::DuplicateEmail => AppError::new(self.kind(), self.to_string())
                .with_action("Sign in or use a different email"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Like [`to_app_error`](Self::to_app_error), keeping a database
    /// failure attached as the source.
    pub fn into_app_error(self) -> AppError {
        match self {
            AuthError::Database(err) => {
                AppError::internal("An internal error occurred").with_source(err)
            }
            other => other.to_app_error(),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Identity database error");
            }
            AuthError::StorageUnavailable(msg) => {
                tracing::error!(message = %msg, "Identity storage unavailable");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Identity internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidToken => {
                tracing::warn!("Invalid bearer token presented");
            }
            _ => {
                tracing::debug!(error = %self, "Identity error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(err: PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AuthError::InvalidToken,
            TokenError::Signing(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(duplicate) = unique_violation(&err) {
            return duplicate;
        }

        if is_unavailable(&err) {
            return AuthError::StorageUnavailable(err.to_string());
        }

        AuthError::Database(err)
    }
}

/// Map a unique-constraint violation to the matching duplicate error.
fn unique_violation(err: &sqlx::Error) -> Option<AuthError> {
    let sqlx::Error::Database(db) = err else {
        return None;
    };

    if db.code().as_deref() != Some(UNIQUE_VIOLATION) {
        return None;
    }

    match db.constraint() {
        Some(LOGIN_UNIQUE_CONSTRAINT) => Some(AuthError::DuplicateLogin),
        Some(EMAIL_UNIQUE_CONSTRAINT) => Some(AuthError::DuplicateEmail),
        _ => None,
    }
}

fn is_unavailable(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| UNAVAILABLE_CLASSES.iter().any(|class| code.starts_with(class))),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::{Field, Rule};

    #[test]
    fn test_status_codes() {
        let validation = AuthError::Validation(ValidationError {
            field: Field::Login,
            rule: Rule::Required,
        });
        assert_eq!(validation.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            AuthError::DuplicateLogin.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AuthError::DuplicateEmail.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AuthError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::StorageUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AuthError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_kind_agrees_with_status() {
        let errors = [
            AuthError::DuplicateEmail,
            AuthError::NotFound,
            AuthError::BadRequest("x".into()),
            AuthError::Unauthorized,
            AuthError::StorageUnavailable("x".into()),
            AuthError::Internal("x".into()),
        ];
        for err in errors {
            assert_eq!(err.kind().status_code(), err.status_code().as_u16());
        }
    }

    #[test]
    fn test_server_errors_are_not_leaked() {
        let app = AuthError::Internal("pool exploded at 0xdeadbeef".into()).to_app_error();
        assert!(!app.message().contains("0xdeadbeef"));

        let app = AuthError::StorageUnavailable("connection refused".into()).to_app_error();
        assert!(!app.message().contains("refused"));
        assert_eq!(app.status_code(), 503);
    }

    #[test]
    fn test_database_cause_kept_as_source() {
        use std::error::Error as _;

        let app = AuthError::Database(sqlx::Error::RowNotFound).into_app_error();
        assert_eq!(app.status_code(), 500);
        assert_eq!(app.message(), "An internal error occurred");
        assert!(app.source().is_some());

        let app = AuthError::DuplicateEmail.into_app_error();
        assert!(app.source().is_none());
        assert!(app.action().is_some());
    }

    #[test]
    fn test_token_error_conversion() {
        assert!(matches!(
            AuthError::from(TokenError::Invalid),
            AuthError::InvalidToken
        ));
        assert!(matches!(
            AuthError::from(TokenError::Signing("bad key".into())),
            AuthError::Internal(_)
        ));
    }

    #[test]
    fn test_sqlx_connectivity_maps_to_unavailable() {
        assert!(matches!(
            AuthError::from(sqlx::Error::PoolTimedOut),
            AuthError::StorageUnavailable(_)
        ));
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(
            AuthError::from(sqlx::Error::Io(io)),
            AuthError::StorageUnavailable(_)
        ));
        assert!(matches!(
            AuthError::from(sqlx::Error::RowNotFound),
            AuthError::Database(_)
        ));
    }

    #[test]
    fn test_credentials_message_is_shared() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "incorrect login/email or password"
        );
    }
}
