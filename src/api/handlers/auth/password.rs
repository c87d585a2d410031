//! One-way hashing for passwords and security answers.
//!
//! Both secrets are stored as Argon2id PHC strings; the salt travels inside
//! the hash, so verification needs nothing but the stored value.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a secret with a fresh random salt.
///
/// # Errors
///
/// Returns an error if the hasher itself fails; never for any input value.
pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash secret: {err}"))?;
    Ok(hash.to_string())
}

/// Verify a candidate against a stored hash.
///
/// # Errors
///
/// Returns an error only when the stored hash is not a valid PHC string; a
/// plain mismatch is `Ok(false)`.
pub fn verify_secret(hash: &str, candidate: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|err| anyhow!("invalid stored hash: {err}"))?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(anyhow!("failed to verify secret: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_verifies_only_the_original_secret() -> Result<()> {
        let hash = hash_secret("Abcdefg1!")?;
        assert!(verify_secret(&hash, "Abcdefg1!")?);
        assert!(!verify_secret(&hash, "abcdefg1!")?);
        assert!(!verify_secret(&hash, "")?);
        Ok(())
    }

    #[test]
    fn same_secret_hashes_to_different_strings() -> Result<()> {
        let first = hash_secret("fish")?;
        let second = hash_secret("fish")?;
        assert_ne!(first, second);
        assert!(verify_secret(&first, "fish")?);
        assert!(verify_secret(&second, "fish")?);
        Ok(())
    }

    #[test]
    fn malformed_stored_hash_is_an_error_not_a_mismatch() {
        assert!(verify_secret("not-a-phc-string", "anything").is_err());
    }
}
