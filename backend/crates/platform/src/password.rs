//! Password Hashing and Verification
//!
//! One-way credential hashing with:
//! - Argon2id (memory-hard, salted, PHC string output)
//! - Tunable work factor via [`HashCost`]
//! - Unicode NFKC normalization before hashing
//! - Zeroization of the clear-text copy we make
//!
//! Policy (length limits, allowed characters) is not enforced here. The
//! identity crate validates before it ever calls the hasher.

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Error Types
// ============================================================================

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Work-factor parameters rejected by Argon2
    #[error("Invalid hash parameters: {0}")]
    InvalidCost(String),

    /// Hashing operation failed (entropy source or parameter failure)
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}

// ============================================================================
// Work factor
// ============================================================================

/// Argon2id work factor.
///
/// The defaults follow the OWASP recommendation (19 MiB, 2 passes, 1 lane).
/// Tests drop this to the Argon2 minimum to keep suites fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// NFKC-normalized clear-text password, erased from memory on drop.
///
/// Does not implement `Clone`; `Debug` is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    pub fn new(raw: &str) -> Self {
        Self(raw.nfkc().collect())
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Argon2id digest in PHC string format (algorithm, version, params, salt, hash).
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    pub fn into_phc_string(self) -> String {
        self.hash
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Credential Hasher
// ============================================================================

/// Salted one-way hasher with a configured work factor.
///
/// Cheap to clone; holds only the Argon2 parameters.
///
/// ## Examples
/// ```rust
/// use platform::password::{CredentialHasher, HashCost};
///
/// let hasher = CredentialHasher::new(HashCost { memory_kib: 8, iterations: 1, parallelism: 1 })?;
/// let digest = hasher.hash("Secret123")?;
///
/// assert!(hasher.verify(digest.as_phc_string(), "Secret123"));
/// assert!(!hasher.verify(digest.as_phc_string(), "secret123"));
/// # Ok::<(), platform::password::PasswordHashError>(())
/// ```
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(cost: HashCost) -> Result<Self, PasswordHashError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordHashError::InvalidCost(e.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a clear-text password with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<HashedPassword, PasswordHashError> {
        let password = ClearTextPassword::new(plaintext);

        // 128-bit salt from the OS RNG
        let salt = SaltString::generate(OsRng);

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }

    /// Check a clear-text password against a stored digest.
    ///
    /// Returns `false` on mismatch and on a malformed digest; never errors.
    /// The digest carries its own parameters, so hashes made with an older
    /// work factor still verify.
    pub fn verify(&self, digest: &str, plaintext: &str) -> bool {
        let parsed_hash = match PasswordHash::new(digest) {
            Ok(h) => h,
            Err(_) => return false,
        };

        let password = ClearTextPassword::new(plaintext);

        // Argon2 compares in constant time
        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Whether a stored digest was produced with different parameters than
    /// the ones currently configured.
    pub fn needs_rehash(&self, digest: &str) -> bool {
        let parsed_hash = match PasswordHash::new(digest) {
            Ok(h) => h,
            Err(_) => return true,
        };

        if parsed_hash.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }

        match Params::try_from(&parsed_hash) {
            Ok(stored) => {
                stored.m_cost() != self.params.m_cost()
                    || stored.t_cost() != self.params.t_cost()
                    || stored.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
