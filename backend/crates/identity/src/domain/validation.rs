//! User validation
//!
//! Pure checks run before every write. The first failing rule wins, in
//! this order: login, username, email, password.

use std::fmt;

use thiserror::Error;

use crate::domain::entity::user::User;

/// Maximum length of `login` and `username`, in characters
pub const HANDLE_MAX_CHARS: usize = 20;

/// Maximum email length (per RFC 5321)
pub const EMAIL_MAX_LENGTH: usize = 254;

const EMAIL_LOCAL_MAX_LENGTH: usize = 64;

pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 40;

/// How the password fields are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordPolicy {
    /// A fresh plaintext must be present (creation).
    Required,
    /// Either an existing digest and no plaintext, or a fresh plaintext
    /// (update).
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Login,
    Username,
    Email,
    Password,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Login => write!(f, "login"),
            Field::Username => write!(f, "username"),
            Field::Email => write!(f, "email"),
            Field::Password => write!(f, "password"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    TooLong { max: usize },
    SurroundingWhitespace,
    NotAlphanumeric,
    InvalidFormat,
    LengthOutOfRange { min: usize, max: usize },
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Required => write!(f, "is required"),
            Rule::TooLong { max } => write!(f, "must be at most {max} characters"),
            Rule::SurroundingWhitespace => write!(f, "must not start or end with whitespace"),
            Rule::NotAlphanumeric => write!(f, "must contain only letters and digits"),
            Rule::InvalidFormat => write!(f, "is not a valid email address"),
            Rule::LengthOutOfRange { min, max } => {
                write!(f, "must be between {min} and {max} characters")
            }
        }
    }
}

/// The first rule a user failed, and on which field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{field} {rule}")]
pub struct ValidationError {
    pub field: Field,
    pub rule: Rule,
}

impl ValidationError {
    fn new(field: Field, rule: Rule) -> Self {
        Self { field, rule }
    }
}

/// Validate every field of `user`.
pub fn validate(user: &User, policy: PasswordPolicy) -> Result<(), ValidationError> {
    validate_handle(Field::Login, &user.login)?;
    validate_handle(Field::Username, &user.username)?;
    validate_email(&user.email)?;

    match policy {
        PasswordPolicy::Required => validate_password(&user.password),
        PasswordPolicy::Optional if user.password.is_empty() => {
            if user.encrypted_password.is_empty() {
                Err(ValidationError::new(Field::Password, Rule::Required))
            } else {
                Ok(())
            }
        }
        PasswordPolicy::Optional => validate_password(&user.password),
    }
}

fn validate_handle(field: Field, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, Rule::Required));
    }

    if value.chars().count() > HANDLE_MAX_CHARS {
        return Err(ValidationError::new(
            field,
            Rule::TooLong {
                max: HANDLE_MAX_CHARS,
            },
        ));
    }

    if value.trim() != value {
        return Err(ValidationError::new(field, Rule::SurroundingWhitespace));
    }

    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::new(field, Rule::NotAlphanumeric));
    }

    Ok(())
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::new(Field::Email, Rule::Required));
    }

    if email.len() > EMAIL_MAX_LENGTH {
        return Err(ValidationError::new(
            Field::Email,
            Rule::TooLong {
                max: EMAIL_MAX_LENGTH,
            },
        ));
    }

    if !is_valid_email_format(email) {
        return Err(ValidationError::new(Field::Email, Rule::InvalidFormat));
    }

    Ok(())
}

/// Basic email format validation
fn is_valid_email_format(email: &str) -> bool {
    // Must contain exactly one @
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if domain.contains('@') {
        return false;
    }

    if local.is_empty() || local.len() > EMAIL_LOCAL_MAX_LENGTH {
        return false;
    }
    if local.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    if domain.is_empty() || !domain.contains('.') {
        return false;
    }

    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return false;
    }

    // Domain shouldn't start or end with dot or hyphen
    !(domain.starts_with(['.', '-']) || domain.ends_with(['.', '-']))
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new(Field::Password, Rule::Required));
    }

    let len = password.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&len) {
        return Err(ValidationError::new(
            Field::Password,
            Rule::LengthOutOfRange {
                min: PASSWORD_MIN_CHARS,
                max: PASSWORD_MAX_CHARS,
            },
        ));
    }

    Ok(())
}
