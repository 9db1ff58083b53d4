//! Error types for the authorization and token-issuance core.
//!
//! Every fallible operation in this crate returns one of the variants
//! defined here; nothing is swallowed or retried internally. The HTTP
//! boundary maps variants to OAuth 2.0 error codes via
//! [`AuthError::oauth_error_code`].

use std::collections::BTreeMap;
use std::fmt;

/// Errors that can occur during authorization and token operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Input failed validation (disallowed redirect URI, missing PKCE
    /// requirement, malformed parameters).
    #[error("Validation failed: {errors}")]
    Validation {
        /// The field-keyed set of validation failures.
        errors: ValidationErrors,
    },

    /// The referenced client, request, token, or key does not exist
    /// (or has been deactivated).
    #[error("Not found: {message}")]
    NotFound {
        /// Description of what was not found.
        message: String,
    },

    /// An authorization request or refresh token is past its absolute
    /// deadline.
    #[error("Expired: {message}")]
    Expired {
        /// Description of what expired.
        message: String,
    },

    /// A state-machine transition was attempted out of order, such as
    /// consuming a still-pending authorization request.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the rejected transition.
        message: String,
    },

    /// PKCE code verifier does not match the stored code challenge, or a
    /// verifier was required but not presented.
    #[error("PKCE validation failed")]
    PkceValidationFailed,

    /// A signing or secret-hashing operation failed.
    #[error("Cryptographic operation failed: {message}")]
    CryptoFailure {
        /// Description of the failed operation.
        message: String,
    },

    /// The backing store timed out or is unreachable. Transient; the
    /// caller may re-initiate the whole operation.
    #[error("Store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the store failure.
        message: String,
    },
}

impl AuthError {
    /// Creates a `Validation` error with a single field failure.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::Validation { errors }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `Expired` error.
    #[must_use]
    pub fn expired(message: impl Into<String>) -> Self {
        Self::Expired {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidState` error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates a new `CryptoFailure` error.
    #[must_use]
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::CryptoFailure {
            message: message.into(),
        }
    }

    /// Creates a new `StoreUnavailable` error.
    #[must_use]
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (request is at fault).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::Expired { .. }
                | Self::InvalidState { .. }
                | Self::PkceValidationFailed
        )
    }

    /// Returns `true` if this is a server-side error.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::CryptoFailure { .. } | Self::StoreUnavailable { .. })
    }

    /// Returns `true` if retrying the same call may succeed without any
    /// change to the request.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    /// Returns the error category for logging and monitoring.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::Lookup,
            Self::Expired { .. } => ErrorCategory::Lifecycle,
            Self::InvalidState { .. } => ErrorCategory::Lifecycle,
            Self::PkceValidationFailed => ErrorCategory::ProofOfPossession,
            Self::CryptoFailure { .. } => ErrorCategory::Crypto,
            Self::StoreUnavailable { .. } => ErrorCategory::Infrastructure,
        }
    }

    /// Returns the OAuth 2.0 error code for this error (RFC 6749 §5.2).
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "invalid_request",
            Self::NotFound { .. } => "invalid_grant",
            Self::Expired { .. } => "invalid_grant",
            Self::InvalidState { .. } => "invalid_grant",
            Self::PkceValidationFailed => "invalid_grant",
            Self::CryptoFailure { .. } => "server_error",
            Self::StoreUnavailable { .. } => "temporarily_unavailable",
        }
    }

    /// Returns the HTTP status code the boundary should respond with.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. }
            | Self::NotFound { .. }
            | Self::Expired { .. }
            | Self::InvalidState { .. }
            | Self::PkceValidationFailed => 400,
            Self::CryptoFailure { .. } => 500,
            Self::StoreUnavailable { .. } => 503,
        }
    }
}

/// A field-keyed collection of validation failures.
///
/// Validation pipelines run every check in order and accumulate failures
/// here instead of stopping at the first one, so a caller can fix a whole
/// submission in one round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Creates an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns `true` if no failures have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the messages recorded for a field, if any.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    /// Iterates over `(field, messages)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Converts the set into an error, or `Ok(())` when empty.
    pub fn into_result(self) -> Result<(), AuthError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AuthError::Validation { errors: self })
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Categories of errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Request or registration validation failures.
    Validation,
    /// Missing clients, requests, tokens, or keys.
    Lookup,
    /// Expiry and state-machine ordering failures.
    Lifecycle,
    /// PKCE binding failures.
    ProofOfPossession,
    /// Signing and hashing failures.
    Crypto,
    /// Backing-store failures.
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Lookup => write!(f, "lookup"),
            Self::Lifecycle => write!(f, "lifecycle"),
            Self::ProofOfPossession => write!(f, "proof_of_possession"),
            Self::Crypto => write!(f, "crypto"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::not_found("unknown client 'web-app'");
        assert_eq!(err.to_string(), "Not found: unknown client 'web-app'");

        let err = AuthError::expired("authorization request past deadline");
        assert_eq!(
            err.to_string(),
            "Expired: authorization request past deadline"
        );

        let err = AuthError::PkceValidationFailed;
        assert_eq!(err.to_string(), "PKCE validation failed");
    }

    #[test]
    fn test_error_predicates() {
        let err = AuthError::not_found("missing");
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert!(!err.is_transient());

        let err = AuthError::store_unavailable("timeout after 5s");
        assert!(!err.is_client_error());
        assert!(err.is_server_error());
        assert!(err.is_transient());

        let err = AuthError::crypto("signing failed");
        assert!(err.is_server_error());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::validation("redirect_uri", "not registered").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            AuthError::invalid_state("already consumed").category(),
            ErrorCategory::Lifecycle
        );
        assert_eq!(
            AuthError::PkceValidationFailed.category(),
            ErrorCategory::ProofOfPossession
        );
    }

    #[test]
    fn test_oauth_error_code() {
        assert_eq!(
            AuthError::validation("scope", "empty").oauth_error_code(),
            "invalid_request"
        );
        assert_eq!(
            AuthError::not_found("token").oauth_error_code(),
            "invalid_grant"
        );
        assert_eq!(
            AuthError::PkceValidationFailed.oauth_error_code(),
            "invalid_grant"
        );
        assert_eq!(
            AuthError::store_unavailable("down").oauth_error_code(),
            "temporarily_unavailable"
        );
        assert_eq!(AuthError::crypto("bad key").http_status(), 500);
        assert_eq!(AuthError::store_unavailable("down").http_status(), 503);
    }

    #[test]
    fn test_validation_errors_accumulate() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("redirect_uri", "must be absolute");
        errors.add("redirect_uri", "must not contain a fragment");
        errors.add("client_id", "cannot be empty");

        assert!(!errors.is_empty());
        assert_eq!(errors.field("redirect_uri").map(<[String]>::len), Some(2));
        assert_eq!(errors.field("client_id").map(<[String]>::len), Some(1));
        assert!(errors.field("scope").is_none());

        let display = errors.to_string();
        assert!(display.contains("client_id: cannot be empty"));
        assert!(display.contains("redirect_uri: must be absolute"));
    }

    #[test]
    fn test_validation_errors_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let mut errors = ValidationErrors::new();
        errors.add("pkce", "public clients must require PKCE");
        let err = errors.into_result().unwrap_err();
        assert!(matches!(err, AuthError::Validation { .. }));
    }
}
