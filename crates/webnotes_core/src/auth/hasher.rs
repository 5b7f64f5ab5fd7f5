//! One-way credential hashing.
//!
//! # Responsibility
//! - Turn plaintext secrets into digests for storage and comparison.
//! - Keep the algorithm behind a trait so callers never depend on it.
//!
//! # Invariants
//! - Digests are never reversed; verification recomputes and compares.
//! - `Sha256Hasher` is deterministic and unsalted. It exists for
//!   compatibility with digests created by the legacy schema and offers no
//!   protection against precomputed dictionaries.
//! - `Argon2Hasher` salts every digest, so two hashes of the same secret
//!   differ and equality checks must go through `verify`.
//! - Digests are not migrated between hashers. Switching the configured
//!   hasher leaves existing users unable to log in until they re-register.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    #[error("failed to hash secret: {0}")]
    Hash(String),
    #[error("stored digest is malformed: {0}")]
    MalformedDigest(String),
}

/// Pluggable one-way transform used for passwords and session tokens.
pub trait CredentialHasher: Send + Sync {
    /// Short algorithm name for logs and configuration.
    fn name(&self) -> &'static str;

    /// Produces a digest for `secret`.
    fn hash(&self, secret: &str) -> Result<String, HashError>;

    /// Checks `secret` against a digest produced by [`CredentialHasher::hash`].
    fn verify(&self, secret: &str, digest: &str) -> Result<bool, HashError> {
        Ok(self.hash(secret)? == digest)
    }

    /// Whether equal secrets always hash to equal digests. Stores may then
    /// match on the digest directly.
    fn is_deterministic(&self) -> bool {
        true
    }
}

/// Unsalted SHA-256, lowercase hex (64 chars).
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl CredentialHasher for Sha256Hasher {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn hash(&self, secret: &str) -> Result<String, HashError> {
        Ok(hex::encode(Sha256::digest(secret.as_bytes())))
    }
}

/// Salted Argon2id digests in PHC string format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn name(&self) -> &'static str {
        "argon2"
    }

    fn hash(&self, secret: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| HashError::Hash(err.to_string()))
    }

    fn verify(&self, secret: &str, digest: &str) -> Result<bool, HashError> {
        let parsed =
            PasswordHash::new(digest).map_err(|err| HashError::MalformedDigest(err.to_string()))?;
        Ok(Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok())
    }

    fn is_deterministic(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::{Argon2Hasher, CredentialHasher, HashError, Sha256Hasher};

    #[test]
    fn sha256_is_deterministic_fixed_length_hex() {
        let hasher = Sha256Hasher;
        let first = hasher.hash("secret").unwrap();
        let second = hasher.hash("secret").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(first, hasher.hash("Secret").unwrap());
    }

    #[test]
    fn sha256_verify_recomputes_and_compares() {
        let hasher = Sha256Hasher;
        let digest = hasher.hash("pw").unwrap();
        assert!(hasher.verify("pw", &digest).unwrap());
        assert!(!hasher.verify("other", &digest).unwrap());
    }

    #[test]
    fn argon2_salts_digests_but_verifies_both() {
        let hasher = Argon2Hasher;
        let first = hasher.hash("pw").unwrap();
        let second = hasher.hash("pw").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2"));
        assert!(hasher.verify("pw", &first).unwrap());
        assert!(hasher.verify("pw", &second).unwrap());
        assert!(!hasher.verify("nope", &first).unwrap());
    }

    #[test]
    fn argon2_rejects_non_phc_digest() {
        let err = Argon2Hasher.verify("pw", "deadbeef").unwrap_err();
        assert!(matches!(err, HashError::MalformedDigest(_)));
    }
}
