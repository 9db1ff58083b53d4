//! Authorization server configuration.
//!
//! Configuration types for the issuance core: OAuth 2.0 lifetimes and
//! policies, signing-key management, and store timeouts. All durations
//! deserialize from humantime strings ("10m", "30d").

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the authorization core.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// issuer = "https://id.example.com"
///
/// [auth.oauth]
/// access_token_lifetime = "1h"
/// refresh_token_lifetime = "30d"
///
/// [auth.signing]
/// algorithm = "RS256"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer URL, used as the `iss` claim and the base for discovery
    /// endpoint URLs.
    pub issuer: String,

    /// OAuth 2.0 configuration.
    pub oauth: OAuthConfig,

    /// Signing-key management configuration.
    pub signing: SigningConfig,

    /// Backing-store configuration.
    pub store: StoreConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            oauth: OAuthConfig::default(),
            signing: SigningConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// OAuth 2.0 configuration.
///
/// Controls token lifetimes and grant policies. Per-client lifetimes
/// override these defaults when set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Authorization request lifetime. Requests expire this long after
    /// creation and the deadline is never extended.
    #[serde(with = "humantime_serde")]
    pub authorization_request_lifetime: Duration,

    /// Default access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Default identity token lifetime.
    #[serde(with = "humantime_serde")]
    pub identity_token_lifetime: Duration,

    /// Default refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Allow a refresh request to narrow the granted scope to a subset
    /// of the original grant. When off (the default), a presented
    /// `scope` parameter must name exactly the granted set and any
    /// other set is rejected. A scope outside the grant is rejected
    /// regardless of this flag.
    pub refresh_scope_narrowing: bool,

    /// Allowed OAuth 2.0 grant types.
    /// Supported: "authorization_code", "refresh_token"
    pub grant_types: Vec<String>,

    /// Scopes advertised in the discovery document.
    pub supported_scopes: Vec<String>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorization_request_lifetime: Duration::from_secs(600), // 10 minutes
            access_token_lifetime: Duration::from_secs(3600),         // 1 hour
            identity_token_lifetime: Duration::from_secs(3600),       // 1 hour
            refresh_token_lifetime: Duration::from_secs(30 * 24 * 3600), // 30 days
            refresh_scope_narrowing: false,
            grant_types: vec![
                "authorization_code".to_string(),
                "refresh_token".to_string(),
            ],
            supported_scopes: vec![
                "openid".to_string(),
                "profile".to_string(),
                "email".to_string(),
                "offline_access".to_string(),
            ],
        }
    }
}

/// Signing-key management configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signing algorithm.
    /// Supported: "RS256", "RS384", "ES384"
    pub algorithm: String,

    /// How long a demoted key stays verifiable after rotation. Tokens
    /// signed just before a rotation remain valid for this window.
    #[serde(with = "humantime_serde")]
    pub rotation_overlap: Duration,

    /// How often the maintenance loop replaces the active signing key.
    /// Rotation is skipped while the active key is younger than this.
    #[serde(with = "humantime_serde")]
    pub rotation_period: Duration,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: "RS256".to_string(),
            rotation_overlap: Duration::from_secs(24 * 3600), // 24 hours
            rotation_period: Duration::from_secs(30 * 24 * 3600), // 30 days
        }
    }
}

/// Backing-store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Upper bound on any single store call. Exceeding it surfaces as
    /// a transient `StoreUnavailable` error.
    #[serde(with = "humantime_serde")]
    pub operation_timeout: Duration,

    /// Interval between background expiry sweeps.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(300), // 5 minutes
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The issuer URL is empty
    /// - The signing algorithm is not supported
    /// - An invalid grant type is specified
    /// - A lifetime or timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        match self.signing.algorithm.as_str() {
            "RS256" | "RS384" | "ES384" => {}
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid signing algorithm: '{}'. Must be RS256, RS384, or ES384",
                    other
                )));
            }
        }

        for grant in &self.oauth.grant_types {
            match grant.as_str() {
                "authorization_code" | "refresh_token" => {}
                other => {
                    return Err(ConfigError::InvalidValue(format!(
                        "Invalid grant type: '{}'. Must be authorization_code or refresh_token",
                        other
                    )));
                }
            }
        }

        if self.oauth.authorization_request_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "authorization_request_lifetime must be > 0".to_string(),
            ));
        }

        if self.oauth.access_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "access_token_lifetime must be > 0".to_string(),
            ));
        }

        if self.oauth.refresh_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "refresh_token_lifetime must be > 0".to_string(),
            ));
        }

        if self.signing.rotation_period.is_zero() {
            return Err(ConfigError::InvalidValue(
                "rotation_period must be > 0".to_string(),
            ));
        }

        if self.store.operation_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "operation_timeout must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
