//! Client secret generation and verification.
//!
//! Confidential clients authenticate at the token endpoint with a
//! secret that is generated once at registration, handed to the client,
//! and stored only as an Argon2id hash.
//!
//! # Security
//!
//! - Secrets are 256-bit random values (32 bytes) with "cs_" prefix
//! - Hashing uses Argon2id (hybrid mode) with default parameters
//! - Salts are generated using OsRng (cryptographically secure RNG)
//!
//! # Example
//!
//! ```
//! use oxident_auth::client_secret::{generate_client_secret, hash_client_secret, verify_client_secret};
//!
//! // Generate a new secret
//! let secret = generate_client_secret();
//! assert!(secret.starts_with("cs_"));
//!
//! // Hash for storage
//! let hash = hash_client_secret(&secret).unwrap();
//!
//! // Verify later
//! assert!(verify_client_secret(&secret, &hash).unwrap());
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;

/// Generate a new cryptographically secure client secret.
///
/// The secret is a 256-bit (32 bytes) random value encoded as
/// hexadecimal with a "cs_" prefix for easy identification.
///
/// # Format
///
/// `cs_{64 hex characters}` (67 characters total)
pub fn generate_client_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    format!("cs_{}", hex::encode(bytes))
}

/// Hash a client secret for secure storage using Argon2id.
///
/// # Returns
///
/// PHC-formatted hash string suitable for database storage.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_client_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a client secret against a stored Argon2 hash.
///
/// # Returns
///
/// `Ok(true)` if the secret matches the hash, `Ok(false)` if it doesn't
/// match. Returns `Err` only if the hash format is invalid.
pub fn verify_client_secret(
    secret: &str,
    hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(secret.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secret_format() {
        let secret = generate_client_secret();
        assert!(secret.starts_with("cs_"), "Secret should start with 'cs_'");
        assert_eq!(secret.len(), 67, "Secret should be 67 chars (cs_ + 64 hex)");

        let hex_part = &secret[3..];
        assert!(
            hex::decode(hex_part).is_ok(),
            "Secret should be valid hex after prefix"
        );
    }

    #[test]
    fn test_generate_secret_uniqueness() {
        assert_ne!(generate_client_secret(), generate_client_secret());
    }

    #[test]
    fn test_hash_is_phc_argon2id() {
        let hash = hash_client_secret(&generate_client_secret()).unwrap();
        assert!(hash.starts_with("$argon2id$"), "Hash should use Argon2id");
    }

    #[test]
    fn test_verify_correct_and_wrong_secret() {
        let secret = generate_client_secret();
        let hash = hash_client_secret(&secret).unwrap();

        assert!(verify_client_secret(&secret, &hash).unwrap());
        assert!(!verify_client_secret("cs_not_the_secret", &hash).unwrap());
    }

    #[test]
    fn test_hash_produces_different_hashes() {
        let secret = generate_client_secret();
        let hash1 = hash_client_secret(&secret).unwrap();
        let hash2 = hash_client_secret(&secret).unwrap();

        // Random salts keep hashes distinct, both still verify.
        assert_ne!(hash1, hash2);
        assert!(verify_client_secret(&secret, &hash1).unwrap());
        assert!(verify_client_secret(&secret, &hash2).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash_format() {
        let result = verify_client_secret(&generate_client_secret(), "invalid_hash_format");
        assert!(result.is_err(), "Invalid hash format should return an error");
    }
}
