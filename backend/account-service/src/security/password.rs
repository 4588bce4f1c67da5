/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password does not match")]
    Mismatch,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// One-way credential capability
pub trait CredentialVerifier: Send + Sync {
    /// PHC-formatted hash safe for storage
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError>;

    /// `Ok(())` on match, `CredentialError::Mismatch` otherwise
    fn verify(&self, hash: &str, plaintext: &str) -> Result<(), CredentialError>;
}

/// Argon2id with the crate default parameters and a random 16-byte salt per hash
#[derive(Debug, Clone, Default)]
pub struct Argon2CredentialVerifier;

impl CredentialVerifier for Argon2CredentialVerifier {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
            .to_string();

        Ok(hash)
    }

    fn verify(&self, hash: &str, plaintext: &str) -> Result<(), CredentialError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| CredentialError::Hashing(format!("invalid password hash format: {e}")))?;

        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(()),
            Err(argon2::password_hash::Error::Password) => Err(CredentialError::Mismatch),
            Err(e) => Err(CredentialError::Hashing(e.to_string())),
        }
    }
}
