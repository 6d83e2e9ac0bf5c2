//! User Entity
//!
//! The identity record. `login` and `email` are the two unique keys;
//! `username` is a display name.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// User entity
///
/// At rest exactly one credential field is populated: `encrypted_password`.
/// `password` only carries a fresh plaintext between the request and the
/// hasher. Neither secret field is ever serialized.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique handle used to sign in
    pub login: String,
    /// Display name
    pub username: String,
    /// Unique email, compared byte-exactly
    pub email: String,
    /// Transient plaintext, cleared once hashed
    #[serde(skip)]
    pub password: String,
    /// PHC digest of the password
    #[serde(skip)]
    pub encrypted_password: String,
}

impl User {
    pub fn new(
        login: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            login: login.into(),
            username: username.into(),
            email: email.into(),
            password: password.into(),
            encrypted_password: String::new(),
        }
    }

    /// Wipe the plaintext password.
    pub fn sanitize(&mut self) {
        self.password.zeroize();
    }

    /// Copy with both secret fields cleared, for handing outward.
    pub fn sanitized(&self) -> Self {
        Self {
            login: self.login.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            password: String::new(),
            encrypted_password: String::new(),
        }
    }

    pub fn has_credential(&self) -> bool {
        !self.encrypted_password.is_empty()
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("login", &self.login)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("encrypted_password", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User::new("alice", "alice", "alice@example.com", "Secret123")
    }

    #[test]
    fn test_sanitize_clears_plaintext() {
        let mut user = alice();
        user.sanitize();
        assert!(user.password.is_empty());
        assert_eq!(user.login, "alice");
    }

    #[test]
    fn test_serialization_skips_secrets() {
        let mut user = alice();
        user.encrypted_password = "$argon2id$v=19$m=8,t=1,p=1$salt$hash".to_string();

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["login"], "alice");
        assert_eq!(json["email"], "alice@example.com");
        assert!(json.get("password").is_none());
        assert!(json.get("encrypted_password").is_none());
    }

    #[test]
    fn test_deserialization_ignores_secrets() {
        let user: User = serde_json::from_str(
            r#"{"login":"bob","username":"Bob","email":"bob@example.com","encrypted_password":"x"}"#,
        )
        .unwrap();
        assert_eq!(user.login, "bob");
        assert!(!user.has_credential());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let output = format!("{:?}", alice());
        assert!(output.contains("alice@example.com"));
        assert!(!output.contains("Secret123"));
    }

    #[test]
    fn test_sanitized_copy() {
        let mut user = alice();
        user.encrypted_password = "digest".to_string();
        let public = user.sanitized();
        assert!(public.password.is_empty());
        assert!(public.encrypted_password.is_empty());
        assert_eq!(public.username, "alice");
    }
}
