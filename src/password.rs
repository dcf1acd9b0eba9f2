use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::PortalError;

/// CredentialHasher
///
/// Abstract hashing capability injected into the AuthService. Raw passwords
/// pass through here exactly once on registration and once per login attempt;
/// they are never persisted or logged.
pub trait CredentialHasher: Send + Sync {
    /// Hashes a raw password into an opaque, self-describing string.
    fn hash(&self, raw: &str) -> Result<String, PortalError>;

    /// Verifies a raw password against a stored hash. A malformed stored hash
    /// is an internal error, not a mismatch.
    fn verify(&self, raw: &str, hash: &str) -> Result<bool, PortalError>;
}

/// Argon2Hasher
///
/// Argon2id with the crate's default parameters and a per-password random
/// salt. The salt and parameters travel inside the PHC string, so verification
/// needs no extra state.
#[derive(Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, raw: &str) -> Result<String, PortalError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| PortalError::Internal(format!("password hashing failed: {e}")))?;
        Ok(hash.to_string())
    }

    fn verify(&self, raw: &str, hash: &str) -> Result<bool, PortalError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| PortalError::Internal(format!("stored hash is malformed: {e}")))?;
        Ok(Argon2::default()
            .verify_password(raw.as_bytes(), &parsed)
            .is_ok())
    }
}
