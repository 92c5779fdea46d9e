//! One-way password digests and verification.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use sha2::{Digest, Sha256};

use tollgate_core::config::PasswordAlgorithm;
use tollgate_core::error::AppError;

const ARGON2_PREFIX: &str = "$argon2";

/// Produces and checks stored credential digests.
///
/// New digests use the configured algorithm. Verification recognises both
/// formats, so switching algorithms does not lock out existing users.
#[derive(Debug, Clone, Default)]
pub struct CredentialHasher {
    algorithm: PasswordAlgorithm,
}

impl CredentialHasher {
    pub fn new(algorithm: PasswordAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The algorithm used for new digests.
    pub fn algorithm(&self) -> PasswordAlgorithm {
        self.algorithm
    }

    /// Digest `plaintext`. An empty password yields an empty digest.
    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        match self.algorithm {
            PasswordAlgorithm::Sha256 => Ok(sha256_hex(plaintext)),
            PasswordAlgorithm::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                Argon2::default()
                    .hash_password(plaintext.as_bytes(), &salt)
                    .map(|hash| hash.to_string())
                    .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
            }
        }
    }

    /// Whether `plaintext` produces `stored`.
    pub fn matches(&self, plaintext: &str, stored: &str) -> Result<bool, AppError> {
        if plaintext.is_empty() || stored.is_empty() {
            return Ok(plaintext.is_empty() && stored.is_empty());
        }

        if stored.starts_with(ARGON2_PREFIX) {
            let parsed = PasswordHash::new(stored)
                .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;
            return match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(AppError::internal(format!(
                    "Password verification failed: {e}"
                ))),
            };
        }

        Ok(sha256_hex(plaintext).eq_ignore_ascii_case(stored))
    }
}

fn sha256_hex(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}
