//! PKCE (Proof Key for Code Exchange) support.
//!
//! Implements RFC 7636 verifier/challenge handling for the authorization
//! code flow. Both transform methods are supported: `S256`
//! (base64url(SHA-256(verifier))) and `plain` (direct equality). `S256`
//! is what [`PkceChallenge::from_verifier`] produces and what clients
//! should use; `plain` exists for constrained clients that cannot hash.
//!
//! Validation at exchange time is a pure function over the stored
//! challenge, its method, and the presented verifier; it touches no
//! state, so a failed check leaves the authorization request intact.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::AuthError;

/// Minimum verifier length per RFC 7636 §4.1.
const MIN_VERIFIER_LENGTH: usize = 43;

/// Maximum verifier length per RFC 7636 §4.1.
const MAX_VERIFIER_LENGTH: usize = 128;

/// Errors from PKCE parsing and verification.
#[derive(Debug, thiserror::Error)]
pub enum PkceError {
    /// The verifier length is outside the RFC 7636 bounds.
    #[error("Invalid verifier length: {0} (must be 43-128)")]
    InvalidVerifierLength(usize),

    /// The verifier contains characters outside the unreserved set.
    #[error("Verifier contains invalid characters")]
    InvalidVerifierCharacters,

    /// The challenge is empty or malformed.
    #[error("Invalid challenge format")]
    InvalidChallengeFormat,

    /// The challenge method is not supported.
    #[error("Unsupported challenge method: {0}")]
    UnsupportedMethod(String),

    /// The recomputed challenge does not match the stored one.
    #[error("Verifier does not match challenge")]
    VerificationFailed,
}

impl From<PkceError> for AuthError {
    fn from(_: PkceError) -> Self {
        AuthError::PkceValidationFailed
    }
}

/// PKCE code challenge methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeChallengeMethod {
    /// Direct equality: challenge == verifier.
    #[serde(rename = "plain")]
    Plain,
    /// challenge == base64url(SHA-256(verifier)).
    #[serde(rename = "S256")]
    S256,
}

impl CodeChallengeMethod {
    /// Parses the wire representation of a challenge method.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::UnsupportedMethod` for anything other than
    /// `plain` or `S256`.
    pub fn parse(value: &str) -> Result<Self, PkceError> {
        match value {
            "plain" => Ok(Self::Plain),
            "S256" => Ok(Self::S256),
            other => Err(PkceError::UnsupportedMethod(other.to_string())),
        }
    }

    /// Returns the wire representation of the method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::S256 => "S256",
        }
    }
}

impl fmt::Display for CodeChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A PKCE code verifier.
///
/// 43-128 characters from the unreserved set
/// `[A-Z] [a-z] [0-9] - . _ ~` (RFC 7636 §4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Validates and wraps a presented verifier.
    ///
    /// # Errors
    ///
    /// Returns `PkceError` if the length or character set is invalid.
    pub fn new(value: impl Into<String>) -> Result<Self, PkceError> {
        let value = value.into();

        if value.len() < MIN_VERIFIER_LENGTH || value.len() > MAX_VERIFIER_LENGTH {
            return Err(PkceError::InvalidVerifierLength(value.len()));
        }

        let valid = value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'));
        if !valid {
            return Err(PkceError::InvalidVerifierCharacters);
        }

        Ok(Self(value))
    }

    /// Generates a new random verifier (32 bytes, base64url-encoded).
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Returns the verifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A PKCE code challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Wraps a challenge presented at authorization time.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::InvalidChallengeFormat` for an empty or
    /// oversized challenge.
    pub fn new(value: impl Into<String>) -> Result<Self, PkceError> {
        let value = value.into();
        if value.is_empty() || value.len() > MAX_VERIFIER_LENGTH {
            return Err(PkceError::InvalidChallengeFormat);
        }
        Ok(Self(value))
    }

    /// Derives the S256 challenge from a verifier.
    #[must_use]
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        let digest = Sha256::digest(verifier.as_str().as_bytes());
        Self(URL_SAFE_NO_PAD.encode(digest))
    }

    /// Verifies a presented verifier against this challenge.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::VerificationFailed` on mismatch.
    pub fn verify(
        &self,
        verifier: &PkceVerifier,
        method: CodeChallengeMethod,
    ) -> Result<(), PkceError> {
        let matches = match method {
            CodeChallengeMethod::Plain => self.0 == verifier.as_str(),
            CodeChallengeMethod::S256 => {
                let digest = Sha256::digest(verifier.as_str().as_bytes());
                self.0 == URL_SAFE_NO_PAD.encode(digest)
            }
        };

        if matches {
            Ok(())
        } else {
            Err(PkceError::VerificationFailed)
        }
    }

    /// Returns the challenge string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validates PKCE at token-exchange time.
///
/// Pure over its inputs: the challenge/method stored on the
/// authorization request, the verifier presented with the exchange, and
/// whether the owning client requires PKCE.
///
/// # Errors
///
/// - `PkceValidationFailed` when a challenge is stored but the verifier
///   is missing, malformed, or does not recompute to the challenge
/// - `Validation` when the client requires PKCE but no challenge was
///   stored at authorization time (the request should never have been
///   accepted; it is rejected here rather than silently passed)
pub fn validate_exchange(
    stored_challenge: Option<&str>,
    stored_method: Option<CodeChallengeMethod>,
    presented_verifier: Option<&str>,
    client_requires_pkce: bool,
) -> Result<(), AuthError> {
    let Some(challenge) = stored_challenge else {
        if client_requires_pkce {
            return Err(AuthError::validation(
                "code_challenge",
                "client requires PKCE but no challenge was stored",
            ));
        }
        return Ok(());
    };

    let verifier = presented_verifier.ok_or(AuthError::PkceValidationFailed)?;
    let verifier = PkceVerifier::new(verifier)?;
    let challenge = PkceChallenge::new(challenge)?;
    let method = stored_method.unwrap_or(CodeChallengeMethod::Plain);

    challenge.verify(&verifier, method)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 7636 Appendix B test vector.
    const RFC_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const RFC_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    #[test]
    fn test_rfc7636_test_vector() {
        let verifier = PkceVerifier::new(RFC_VERIFIER).unwrap();
        let challenge = PkceChallenge::from_verifier(&verifier);
        assert_eq!(challenge.as_str(), RFC_CHALLENGE);
    }

    #[test]
    fn test_s256_verify() {
        let verifier = PkceVerifier::new(RFC_VERIFIER).unwrap();
        let challenge = PkceChallenge::new(RFC_CHALLENGE).unwrap();
        assert!(challenge.verify(&verifier, CodeChallengeMethod::S256).is_ok());
    }

    #[test]
    fn test_s256_mismatch_fails() {
        let wrong = PkceVerifier::generate();
        let challenge = PkceChallenge::new(RFC_CHALLENGE).unwrap();
        let err = challenge
            .verify(&wrong, CodeChallengeMethod::S256)
            .unwrap_err();
        assert!(matches!(err, PkceError::VerificationFailed));
    }

    #[test]
    fn test_plain_verify() {
        let verifier = PkceVerifier::new(RFC_VERIFIER).unwrap();
        let challenge = PkceChallenge::new(RFC_VERIFIER).unwrap();
        assert!(
            challenge
                .verify(&verifier, CodeChallengeMethod::Plain)
                .is_ok()
        );

        // A plain challenge does not verify under S256.
        assert!(
            challenge
                .verify(&verifier, CodeChallengeMethod::S256)
                .is_err()
        );
    }

    #[test]
    fn test_verifier_length_bounds() {
        assert!(matches!(
            PkceVerifier::new("too-short"),
            Err(PkceError::InvalidVerifierLength(9))
        ));
        assert!(PkceVerifier::new("a".repeat(43)).is_ok());
        assert!(PkceVerifier::new("a".repeat(128)).is_ok());
        assert!(matches!(
            PkceVerifier::new("a".repeat(129)),
            Err(PkceError::InvalidVerifierLength(129))
        ));
    }

    #[test]
    fn test_verifier_character_set() {
        assert!(PkceVerifier::new("abcDEF123-._~".repeat(4)).is_ok());
        let mut bad = "a".repeat(42);
        bad.push('!');
        assert!(matches!(
            PkceVerifier::new(bad),
            Err(PkceError::InvalidVerifierCharacters)
        ));
    }

    #[test]
    fn test_generated_verifier_is_valid() {
        let generated = PkceVerifier::generate();
        assert!(PkceVerifier::new(generated.as_str().to_string()).is_ok());
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(
            CodeChallengeMethod::parse("S256").unwrap(),
            CodeChallengeMethod::S256
        );
        assert_eq!(
            CodeChallengeMethod::parse("plain").unwrap(),
            CodeChallengeMethod::Plain
        );
        assert!(matches!(
            CodeChallengeMethod::parse("S512"),
            Err(PkceError::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn test_validate_exchange_success() {
        let result = validate_exchange(
            Some(RFC_CHALLENGE),
            Some(CodeChallengeMethod::S256),
            Some(RFC_VERIFIER),
            true,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_exchange_missing_verifier_fails() {
        let err = validate_exchange(
            Some(RFC_CHALLENGE),
            Some(CodeChallengeMethod::S256),
            None,
            true,
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::PkceValidationFailed));
    }

    #[test]
    fn test_validate_exchange_mismatch_fails() {
        let err = validate_exchange(
            Some(RFC_CHALLENGE),
            Some(CodeChallengeMethod::S256),
            Some(&"a".repeat(43)),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::PkceValidationFailed));
    }

    #[test]
    fn test_validate_exchange_no_challenge_pkce_required() {
        let err = validate_exchange(None, None, Some(RFC_VERIFIER), true).unwrap_err();
        assert!(matches!(err, AuthError::Validation { .. }));
    }

    #[test]
    fn test_validate_exchange_no_challenge_pkce_optional() {
        assert!(validate_exchange(None, None, None, false).is_ok());
    }
}
